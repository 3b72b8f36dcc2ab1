pub mod application;
pub mod export;
pub mod form;

pub use application::{Application, ApplicationService, ApplicationServiceImpl};
pub use form::{FormController, FormSchema, FormValues};
