mod ctf;
mod progress;

pub mod types;

pub use ctf::{CtfId, CtfRecord};
pub use progress::{LeaderboardEntry, SubmissionRecord};
