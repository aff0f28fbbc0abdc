use std::collections::HashSet;

use tracing::{info, warn};

use crate::{
    api::{ApiError, CtfBackend},
    models::{CtfId, CtfRecord},
};

use super::{BoardData, BoardQuery};

/// Lists the CTFs matching `query` and checks which of them the user joined.
///
/// A failed membership check only affects that CTF, which then shows as not
/// joined. An expired session aborts the whole cycle.
#[tracing::instrument(skip(backend))]
pub async fn fetch_board_data(
    backend: &dyn CtfBackend,
    query: &BoardQuery,
) -> Result<BoardData, ApiError> {
    let ctfs = backend.available_ctfs(&query.to_params()).await?;

    let mut joined = HashSet::new();
    for ctf in &ctfs {
        match backend.is_joined(&ctf.id).await {
            Ok(true) => {
                joined.insert(ctf.id.clone());
            }
            Ok(false) => {}
            Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
            Err(err) => warn!("Could not check joined status of CTF {}: {err}", ctf.id),
        }
    }

    info!("Fetched {} CTFs, {} of them joined", ctfs.len(), joined.len());

    Ok(BoardData { ctfs, joined })
}

/// Fetches a single CTF and the user's membership in it.
#[tracing::instrument(skip(backend))]
pub async fn fetch_ctf(backend: &dyn CtfBackend, id: &CtfId) -> Result<(CtfRecord, bool), ApiError> {
    let ctf = backend.ctf_detail(id).await?;
    let joined = backend.is_joined(id).await?;

    Ok((ctf, joined))
}
