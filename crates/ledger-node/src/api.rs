//! HTTP surface of the node. One ledger behind an async `RwLock`; mining runs on the
//! blocking pool and only takes the write lock to insert its result.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    constants::GENESIS_PARENT_HASH, Block, CancelToken, CodecError, Ledger, MineError,
    RejectionReason, SystemClock,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) ledger: Arc<RwLock<Ledger>>,
    pub(crate) self_address: String,
    /// Fired on shutdown to stop in-flight mining.
    pub(crate) cancel: CancelToken,
}

impl AppState {
    pub(crate) fn new(ledger: Ledger, self_address: String) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            self_address,
            cancel: CancelToken::new(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("block rejected: {0}")]
    Rejected(RejectionReason),
    #[error("no blocks at height {0}")]
    HeightNotFound(u32),
    #[error("unknown parent block {0}")]
    UnknownParent(String),
    #[error(transparent)]
    Mining(#[from] MineError),
    #[error("mining task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<RejectionReason>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Codec(CodecError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Codec(CodecError::Encode(_))
            | ApiError::Join(_)
            | ApiError::Mining(MineError::Unreachable { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected(_) => StatusCode::CONFLICT,
            ApiError::HeightNotFound(_) | ApiError::UnknownParent(_) => StatusCode::NOT_FOUND,
            ApiError::Mining(MineError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let reason = match &self {
            ApiError::Rejected(reason) => Some(*reason),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    address: String,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct Head {
    pub(crate) length: u32,
    pub(crate) blocks: usize,
    pub(crate) tips: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct SubmitResponse {
    pub(crate) accepted: bool,
    pub(crate) hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reason: Option<RejectionReason>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MineRequest {
    pub(crate) value: String,
    /// Parent to build on. Defaults to the first tip, or a genesis block when empty.
    #[serde(default)]
    pub(crate) parent_hash: Option<String>,
}

pub(crate) fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", get(get_chain))
        .route("/chain/head", get(chain_head))
        .route("/blocks", post(submit_block))
        .route("/blocks/{height}", get(blocks_at_height))
        .route("/mine", post(mine))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        address: state.self_address.clone(),
    })
}

async fn get_chain(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.ledger.read().await.to_json()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn chain_head(State(state): State<AppState>) -> Json<Head> {
    let ledger = state.ledger.read().await;
    Json(Head {
        length: ledger.length(),
        blocks: ledger.block_count(),
        tips: ledger.tips().iter().map(|b| b.hash.clone()).collect(),
    })
}

async fn blocks_at_height(
    State(state): State<AppState>,
    Path(height): Path<u32>,
) -> Result<Json<Vec<Block>>, ApiError> {
    let blocks = state.ledger.read().await.slot(height).map(<[Block]>::to_vec);
    blocks.map(Json).ok_or(ApiError::HeightNotFound(height))
}

async fn submit_block(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let block = Block::from_json(&body)?;
    let (height, hash) = (block.height, block.hash.clone());
    let outcome = state.ledger.write().await.insert(block);
    match outcome {
        Ok(()) => {
            info!("accepted block {} at height {}", hash, height);
            Ok((
                StatusCode::CREATED,
                Json(SubmitResponse {
                    accepted: true,
                    hash,
                    reason: None,
                }),
            ))
        }
        Err(reason) => {
            warn!("rejected block {} at height {}: {}", hash, height, reason);
            Ok((
                StatusCode::CONFLICT,
                Json(SubmitResponse {
                    accepted: false,
                    hash,
                    reason: Some(reason),
                }),
            ))
        }
    }
}

async fn mine(
    State(state): State<AppState>,
    Json(req): Json<MineRequest>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let block = mine_and_insert(&state, req.parent_hash, req.value).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

/// Build a block on `parent_hash` (or the current tip), mine it off the async runtime
/// and insert it.
pub(crate) async fn mine_and_insert(
    state: &AppState,
    parent_hash: Option<String>,
    value: String,
) -> Result<Block, ApiError> {
    let (height, parent_hash, difficulty) = {
        let ledger = state.ledger.read().await;
        let difficulty = ledger.config().difficulty;
        match parent_hash {
            Some(parent) => {
                let height = ledger
                    .blocks()
                    .find(|b| b.hash == parent)
                    .map(|b| b.height + 1)
                    .ok_or_else(|| ApiError::UnknownParent(parent.clone()))?;
                (height, parent, difficulty)
            }
            None => match ledger.tips().first() {
                Some(tip) => (tip.height + 1, tip.hash.clone(), difficulty),
                None => (
                    ledger.config().genesis_height,
                    GENESIS_PARENT_HASH.to_string(),
                    difficulty,
                ),
            },
        }
    };

    let cancel = state.cancel.clone();
    let block = tokio::task::spawn_blocking(move || -> Result<Block, MineError> {
        let mut block = Block::new(height, parent_hash, value, &SystemClock);
        block.mine(difficulty, &mut rand::thread_rng(), &cancel)?;
        Ok(block)
    })
    .await??;

    state
        .ledger
        .write()
        .await
        .insert(block.clone())
        .map_err(ApiError::Rejected)?;
    info!("mined and admitted block {} at height {}", block.hash, block.height);
    Ok(block)
}
