use axum::{
    Router,
    routing::{get, post},
    response::{IntoResponse, Response},
    http::StatusCode,
    extract::{Multipart, multipart::MultipartError},
    Json,
};
use crate::models::ErrorResponse;
use gamelog::{DamageStream, ParseError};
use std::io::Cursor;
use tracing::{info, debug, error, instrument};

/// Multipart field carrying the raw game log.
const LOG_FIELD: &str = "logfile";

pub fn create_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/parse_file", post(parse_file))
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No log file provided")]
    MissingLogFile,
    #[error("Can't parse file: {0}")]
    Parse(#[from] ParseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[instrument(skip(multipart))]
async fn parse_file(mut multipart: Multipart) -> Result<Json<Vec<DamageStream>>, ApiError> {
    info!("Received log upload request");

    let mut log_content = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Multipart error: {}", e);
        e
    })? {
        if field.name() == Some(LOG_FIELD) {
            let data = field.bytes().await?;
            info!("Log data received: {} bytes", data.len());
            log_content = Some(data);
        } else {
            debug!("Skipping multipart field {:?}", field.name());
        }
    }

    let Some(data) = log_content else {
        error!("No {} field in request", LOG_FIELD);
        return Err(ApiError::MissingLogFile);
    };

    let log = gamelog::parse_log(Cursor::new(data)).map_err(|e| {
        error!("Could not parse file: {}", e);
        e
    })?;
    let streams = gamelog::extract_streams(&log);

    info!(
        "Returning {} damage streams for listener {}",
        streams.len(),
        log.listener
    );
    Ok(Json(streams))
}
