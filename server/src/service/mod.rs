pub mod config;
pub mod pipeline;

pub use config::ServiceConfig;
pub use pipeline::{Pipeline, ServiceError, UploadForm};
