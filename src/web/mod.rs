pub mod extract;
pub mod generic_response;

pub use extract::{JsonBody, PathParam};
pub use generic_response::{GenericResponse, ValidationError};
