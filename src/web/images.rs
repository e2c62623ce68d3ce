//! Strip downloads. A strip is written once with its record, so the record's
//! id and creation time are enough to validate a cached copy.

use std::io::ErrorKind;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::header::{
    CACHE_CONTROL, CONTENT_TYPE, ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use httpdate::{fmt_http_date, parse_http_date};
use tracing::error;

use crate::constants::STRIP_CACHE_CONTROL;
use crate::db::entities::comic_strips;
use crate::error::ComicError;
use crate::media::{MediaStore, content_type_for};

/// Validators for one stored strip.
#[derive(Clone, Debug, PartialEq, Eq)]
struct StripValidators {
    etag: String,
    last_modified: SystemTime,
}

impl StripValidators {
    fn for_comic(comic: &comic_strips::Model) -> Self {
        // whole seconds, HTTP dates carry nothing finer
        let secs = u64::try_from(comic.created_at.and_utc().timestamp()).unwrap_or(0);
        Self {
            etag: format!("\"comic-{}-{secs}\"", comic.id),
            last_modified: UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    fn headers(&self) -> [(HeaderName, String); 3] {
        [
            (CACHE_CONTROL, STRIP_CACHE_CONTROL.to_string()),
            (ETAG, self.etag.clone()),
            (LAST_MODIFIED, fmt_http_date(self.last_modified)),
        ]
    }

    /// If-None-Match wins over If-Modified-Since when both are sent.
    fn matches(&self, request: &HeaderMap) -> bool {
        if let Some(if_none_match) = request.get(IF_NONE_MATCH) {
            return if_none_match.to_str().is_ok_and(|value| {
                value.split(',').map(str::trim).any(|candidate| {
                    candidate == "*"
                        || candidate.strip_prefix("W/").unwrap_or(candidate) == self.etag
                })
            });
        }
        request
            .get(IF_MODIFIED_SINCE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_http_date(value).ok())
            .is_some_and(|since| self.last_modified <= since)
    }
}

/// The strip PNG for `comic`, or 304 when the client copy is current.
pub(crate) async fn strip_response(
    media: &MediaStore,
    comic: &comic_strips::Model,
    request: &HeaderMap,
) -> Result<Response, ComicError> {
    let validators = StripValidators::for_comic(comic);
    if validators.matches(request) {
        return Ok((StatusCode::NOT_MODIFIED, validators.headers()).into_response());
    }

    let path = media.resolve(&comic.image_path)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            error!("Strip for comic {} is missing from {}", comic.id, path.display());
            return Err(ComicError::NotFound(format!("strip for comic {}", comic.id)));
        }
        Err(err) => return Err(err.into()),
    };
    Ok((
        validators.headers(),
        [(CONTENT_TYPE, content_type_for(&path))],
        bytes,
    )
        .into_response())
}
