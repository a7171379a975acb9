use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use crate::pipeline::Pipeline;

mod ask;
mod ingest;
mod kakao;

pub use ingest::Ingestor;

pub fn routes(
    pipeline: Arc<Pipeline>,
    ingestor: Arc<Ingestor>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    let ingest_route = api
        .and(warp::path("ingest"))
        .and(warp::post())
        .and(warp::multipart::form().max_length(100 * 1024 * 1024)) // 100MB max
        .and(with_ingestor(ingestor))
        .and_then(ingest::handle_ingest);

    let ask_route = api
        .and(warp::path("ask"))
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pipeline(pipeline.clone()))
        .and_then(ask::handle_ask);

    let kakao_route = warp::path("kakao")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pipeline(pipeline))
        .and_then(kakao::handle_kakao);

    ingest_route.or(ask_route).or(kakao_route)
}

fn with_pipeline(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (Arc<Pipeline>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || pipeline.clone())
}

fn with_ingestor(
    ingestor: Arc<Ingestor>,
) -> impl Filter<Extract = (Arc<Ingestor>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || ingestor.clone())
}
