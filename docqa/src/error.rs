use thiserror::Error;
use warp::{reject::Reject, Rejection, Reply};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream service failure: {0}")]
    Upstream(String),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl Reject for ApiError {}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(api_err) = err.find::<ApiError>() {
        let (code, message) = match api_err {
            ApiError::InvalidConfig(_) => (400, "Invalid configuration"),
            ApiError::BadRequest(_) => (400, "Bad request"),
            ApiError::Upstream(_) | ApiError::HttpError(_) => {
                (502, "Upstream service failure")
            }
            _ => (500, "Internal server error"),
        };

        let json = warp::reply::json(&serde_json::json!({
            "error": message,
            "details": api_err.to_string(),
        }));

        Ok(warp::reply::with_status(
            json,
            warp::http::StatusCode::from_u16(code).unwrap(),
        ))
    } else {
        Err(err)
    }
}
