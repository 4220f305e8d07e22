pub mod services;
pub mod staging;

pub use services::upload_staged;
pub use staging::{stage_bytes, StagedFile};
