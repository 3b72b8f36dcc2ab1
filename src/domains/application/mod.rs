pub mod repository;
pub mod service;
pub mod types;

pub use repository::{ApplicationRepository, InMemoryApplicationRepository};
pub use service::{ApplicationService, ApplicationServiceImpl};
pub use types::{Application, ApplicationStatus, NewApplication};
