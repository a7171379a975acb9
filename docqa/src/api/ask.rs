use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use warp::{Rejection, Reply};

use crate::error::ApiError;
use crate::models::{AskRequest, AskResponse};
use crate::pipeline::Pipeline;

pub async fn handle_ask(
    request: AskRequest,
    pipeline: Arc<Pipeline>,
) -> Result<impl Reply, Rejection> {
    if request.question.trim().is_empty() {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "missing question".to_string(),
        )));
    }
    if request.user_id.trim().is_empty() {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "missing user_id".to_string(),
        )));
    }

    let request_id = Uuid::new_v4();
    info!(%request_id, user_id = %request.user_id, "processing question");

    let result = pipeline
        .ask(&request.question, &request.user_id)
        .await
        .map_err(warp::reject::custom)?;

    info!(%request_id, answer_len = result.text.len(), "question answered");

    Ok(warp::reply::json(&AskResponse {
        request_id,
        answer: result.text,
    }))
}
