use crate::error::{AppError, Result};
use crate::model::{ListResponse, ShortenRequest, ShortenResponse};
use crate::state::AppState;
use crate::validation::validate_url;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use shorty_core::{ShortLink, StorageError};
use tracing::{debug, info, warn};

/// How many freshly generated codes to try before giving up on collisions.
const MAX_SHORTEN_ATTEMPTS: usize = 5;

pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_url(&request.url)?;

    for attempt in 1..=MAX_SHORTEN_ATTEMPTS {
        let code = state.generator().generate();
        let link = ShortLink::new(request.url.as_str(), code.as_str());

        match state.repository().save(link).await {
            Ok(saved) => {
                info!(short = %saved.short, id = saved.id, "created short link");
                return Ok(Json(ShortenResponse {
                    short_url: state.short_url(&saved.short),
                    original: saved.original,
                    short_code: saved.short,
                }));
            }
            Err(StorageError::DuplicateKey(_)) => {
                warn!(short = %code, attempt, "generated short code collided, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::Storage(StorageError::DuplicateKey(format!(
        "no free short code after {MAX_SHORTEN_ATTEMPTS} attempts"
    ))))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let link = state.repository().get(&short_code).await?;

    // The redirect is already decided; a lost click is only logged.
    if let Err(err) = state.repository().increment_clicks(&short_code).await {
        warn!(short = %short_code, error = %err, "failed to record click");
    }

    debug!(short = %short_code, target = %link.original, "redirecting");
    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, link.original)],
    )
        .into_response())
}

pub async fn stats_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ShortLink>> {
    Ok(Json(state.repository().get(&short_code).await?))
}

pub async fn list_handler(State(state): State<AppState>) -> Result<Json<ListResponse>> {
    let urls = state.repository().get_all().await?;
    Ok(Json(ListResponse {
        count: urls.len(),
        urls,
    }))
}
