// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route prefix: /api
// Middleware: none

pub mod session;
pub mod users;

pub use session::verify_user;
pub use users::{create_user, grouped_user};
