pub mod error;
pub mod model;
pub mod repository;
pub mod validation;

pub use error::ProfileError;
pub use model::{Profile, ProfileFields, RankedPage};
pub use repository::ProfileRepository;
pub use validation::{is_valid_email, parse_fields, validate_fields, ValidationError};
