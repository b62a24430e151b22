//! Session API
//!
//! Session bootstrap plus the [`SessionId`] extractor every other handler
//! uses to identify the caller.

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, header, request::Parts},
    response::IntoResponse,
};
use ideaforge_core::dto::session::SessionInit;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::session_service;

pub const SESSION_COOKIE: &str = "anon_session_id";
pub const SESSION_HEADER: &str = "x-session-id";

const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// The caller's session, verified to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

impl FromRequestParts<AppState> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = session_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("No session".to_string()))?;

        let session = session_service::resolve_session(&state.pool, id).await?;
        Ok(SessionId(session.id))
    }
}

/// POST /session/init
/// Reuse the caller's session or create one, and set the session cookie
pub async fn init_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let presented = session_from_headers(&headers);
    let session = session_service::init_session(&state.pool, presented).await?;

    let cookie = session_cookie(session.id, state.settings.cookie_secure);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionInit {
            session_id: session.id,
        }),
    ))
}

/// Session id from the cookie, falling back to the header
pub fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());

    from_cookie.or_else(|| {
        headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
    })
}

pub fn session_cookie(id: Uuid, secure: bool) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
        SESSION_COOKIE,
        id,
        COOKIE_MAX_AGE_SECS,
        if secure { "; Secure" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_from_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; anon_session_id={}", id)).unwrap(),
        );
        assert_eq!(session_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let cookie_id = Uuid::new_v4();
        let header_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("anon_session_id={}", cookie_id)).unwrap(),
        );
        headers.insert(
            SESSION_HEADER,
            HeaderValue::from_str(&header_id.to_string()).unwrap(),
        );
        assert_eq!(session_from_headers(&headers), Some(cookie_id));
    }

    #[test]
    fn test_session_from_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(session_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_garbage_session_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("anon_session_id=nope"));
        assert_eq!(session_from_headers(&headers), None);
        assert_eq!(session_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = Uuid::nil();
        let cookie = session_cookie(id, false);
        assert_eq!(
            cookie,
            format!(
                "anon_session_id={}; Path=/; Max-Age=31536000; HttpOnly; SameSite=Lax",
                id
            )
        );
        assert!(session_cookie(id, true).ends_with("; Secure"));
    }
}
