use async_trait::async_trait;

use crate::models::{CtfId, CtfRecord, LeaderboardEntry, SubmissionRecord};

use super::{ApiError, CtfListParams, SubmissionReceipt};

/// The remote endpoints the CTF board reads from and acts through.
#[async_trait]
pub trait CtfBackend: Send + Sync {
    async fn available_ctfs(&self, params: &CtfListParams) -> Result<Vec<CtfRecord>, ApiError>;

    async fn ctf_detail(&self, id: &CtfId) -> Result<CtfRecord, ApiError>;

    async fn is_joined(&self, id: &CtfId) -> Result<bool, ApiError>;

    async fn join_ctf(&self, id: &CtfId) -> Result<(), ApiError>;

    async fn submit_flag(&self, id: &CtfId, flag: &str) -> Result<SubmissionReceipt, ApiError>;
}

/// Read-only standings and submission history.
#[async_trait]
pub trait ProgressBackend: Send + Sync {
    async fn global_leaderboard(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>, ApiError>;

    async fn ctf_leaderboard(&self, id: &CtfId) -> Result<Vec<LeaderboardEntry>, ApiError>;

    async fn my_submissions(&self, limit: Option<u32>) -> Result<Vec<SubmissionRecord>, ApiError>;
}
