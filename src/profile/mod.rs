mod extract;
mod validate;

pub use extract::{extract_profile, ExtractedProfile};
pub use validate::{validate_field, ValidationError};
