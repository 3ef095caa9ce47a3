use crate::http::form::read_upload;
use crate::service::{Pipeline, ServiceError};
use anyhow::Context;
use log::{info, warn};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::{Filter, Rejection, Reply};

async fn detect_smart(form: FormData, pipeline: Arc<Pipeline>) -> Result<impl Reply, Rejection> {
    let upload = read_upload(form)
        .await
        .map_err(|e| warp::reject::custom(ServiceError::MalformedForm(e.to_string())))?;
    let record = pipeline.ingest(upload).await.map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&record))
}

/// Turns every rejection into a JSON `{"error": ..}` body.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(service_err) = err.find::<ServiceError>() {
        (service_err.status(), service_err.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "upload too large".to_string())
    } else if err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
    {
        // No body, or not a multipart one, so there is no file to read.
        (StatusCode::BAD_REQUEST, ServiceError::MissingFile.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "error": message })),
        code,
    ))
}

/// Upload, list and stats endpoints with JSON error replies and open CORS.
pub fn routes(
    pipeline: Arc<Pipeline>,
    max_upload_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let pipeline_filter = warp::any().map(move || pipeline.clone());

    let detect_route = warp::path!("api" / "detect" / "smart")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(pipeline_filter.clone())
        .and_then(detect_smart);

    let main_list_route = warp::path!("api" / "main-list")
        .and(warp::get())
        .and(pipeline_filter.clone())
        .map(|pipeline: Arc<Pipeline>| warp::reply::json(&pipeline.store().main_list()));

    let waiting_list_route = warp::path!("api" / "waiting-list")
        .and(warp::get())
        .and(pipeline_filter.clone())
        .map(|pipeline: Arc<Pipeline>| warp::reply::json(&pipeline.store().waiting_list()));

    let stats_route = warp::path!("api" / "stats")
        .and(warp::get())
        .and(pipeline_filter)
        .map(|pipeline: Arc<Pipeline>| warp::reply::json(&pipeline.metrics()));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    detect_route
        .or(main_list_route)
        .or(waiting_list_route)
        .or(stats_route)
        .with(cors)
        .recover(handle_rejection)
}

/// Serves until Ctrl+C.
pub async fn serve(
    pipeline: Arc<Pipeline>,
    bind: SocketAddr,
    max_upload_bytes: u64,
) -> anyhow::Result<()> {
    let (addr, server) = warp::serve(routes(pipeline, max_upload_bytes))
        .try_bind_with_graceful_shutdown(bind, async {
            if let Err(err) = signal::ctrl_c().await {
                warn!("awaiting Ctrl+C failed: {}", err);
            }
        })
        .with_context(|| format!("binding HTTP listener on {}", bind))?;

    info!("listening on http://{}", addr);
    server.await;
    info!("shutdown complete");
    Ok(())
}
