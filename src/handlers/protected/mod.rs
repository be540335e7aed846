// handlers/protected/mod.rs - Handlers behind the bearer-token gate
//
// Every handler here receives the verified caller as `Extension<Identity>`
// and only ever touches the profile that belongs to that identity's email.

pub mod profile;

pub use profile::{fetch_user_data, update_user_data};
