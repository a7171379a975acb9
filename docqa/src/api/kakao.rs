use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use warp::{Rejection, Reply};

use crate::pipeline::Pipeline;

/// KakaoTalk simpleText payload limit.
const MAX_REPLY_CHARS: usize = 1000;

const APOLOGY: &str =
    "죄송해요, 지금은 답변을 드리기 어려워요. 잠시 후 다시 시도해 주세요.";

#[derive(Debug, Deserialize)]
pub struct KakaoRequest {
    #[serde(rename = "userRequest")]
    user_request: UserRequest,
}

#[derive(Debug, Deserialize)]
struct UserRequest {
    utterance: String,
    user: KakaoUser,
}

#[derive(Debug, Deserialize)]
struct KakaoUser {
    id: String,
}

/// KakaoTalk skill-server webhook. The platform contract allows no error
/// statuses: every failure becomes an apology reply in a well-formed
/// envelope.
pub async fn handle_kakao(
    request: KakaoRequest,
    pipeline: Arc<Pipeline>,
) -> Result<impl Reply, Rejection> {
    let question = request.user_request.utterance.trim();
    let user_id = &request.user_request.user.id;

    let text = if question.is_empty() {
        APOLOGY.to_string()
    } else {
        match pipeline.ask(question, user_id).await {
            Ok(result) => {
                info!(user_id = %user_id, answer_len = result.text.len(), "kakao reply sent");
                result.text
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "kakao pipeline failed, sending apology");
                APOLOGY.to_string()
            }
        }
    };

    Ok(warp::reply::json(&reply_envelope(&text)))
}

fn reply_envelope(text: &str) -> serde_json::Value {
    json!({
        "version": "2.0",
        "template": {
            "outputs": [
                { "simpleText": { "text": truncate_chars(text, MAX_REPLY_CHARS) } }
            ]
        }
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
