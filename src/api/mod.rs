mod backend;
mod client;
mod error;
mod types;

pub use backend::{CtfBackend, ProgressBackend};
pub use client::ApiClient;
pub use error::ApiError;
pub use types::{CtfListParams, SubmissionReceipt};
