//! WebSocket inbound adapter for live course chat.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, session, chat access)
//! - hand the upgraded connection to the per-connection session loop
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, warn};
use url::Url;

use crate::domain::ports::CourseChat;
use crate::domain::{CourseId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_caller;
use crate::inbound::http::session::SessionContext;

pub mod hub;
pub mod messages;
mod session;
pub mod state;

pub use hub::ChatHub;
pub use state::WsState;

/// Handle WebSocket upgrade for a course chat room.
///
/// Mounted under the `/ws` scope, so the public path is `/ws/courses/{id}`.
/// The upgrade is refused before any socket work when the `Origin` is not
/// allow-listed, the caller has no session, or chat access is denied.
#[get("/courses/{id}")]
pub async fn chat_ws_entry(
    ws_state: web::Data<WsState>,
    http_session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
    body: Payload,
) -> ApiResult<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("missing Origin header on WebSocket upgrade");
        Error::forbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("multiple Origin headers on WebSocket upgrade");
        return Err(Error::invalid_request("Invalid Origin header"));
    }
    validate_origin(origin_header)?;

    let course_id = CourseId::new(path.into_inner())
        .map_err(|_| Error::invalid_request("course id must be a valid UUID"))?;
    let caller = require_caller(ws_state.accounts.as_ref(), &http_session).await?;
    ws_state.chat.authorise(&course_id, &caller).await?;

    let (response, ws_session, msg_stream) =
        actix_ws::handle(&req, body).map_err(|upgrade_error| {
            error!(error = %upgrade_error, "WebSocket upgrade failed");
            Error::internal("WebSocket upgrade failed")
        })?;

    actix_web::rt::spawn(session::handle_chat_session(
        ws_state.chat.clone(),
        ws_state.hub.clone(),
        course_id,
        caller,
        ws_session,
        msg_stream,
    ));

    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue) -> Result<(), Error> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(parse_error) => {
            error!(error = %parse_error, "failed to parse Origin header as string");
            return Err(Error::invalid_request("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|parse_error| {
        error!(error = %parse_error, "failed to parse Origin header as URL");
        Error::invalid_request("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "rejected WS upgrade due to disallowed Origin"
        );
        Err(Error::forbidden("Origin not allowed"))
    }
}

const PRIMARY_HOST: &str = "learnhub.example";
const LOCALHOST: &str = "localhost";
const ALLOWED_SUBDOMAIN_SUFFIX: &str = ".learnhub.example";

/// Returns true when a parsed Origin belongs to the static allow-list.
///
/// The allow-list currently accepts HTTPS requests from the production root
/// domain and any of its subdomains, and HTTP requests from localhost with a
/// non-zero explicit port. Once configuration is available this should move
/// into a runtime-controlled allow-list.
fn is_allowed_origin(origin: &Url) -> bool {
    let host = match origin.host_str() {
        Some(value) => value,
        None => return false,
    };

    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" if host == PRIMARY_HOST => true,
        "https" if host.strip_suffix(ALLOWED_SUBDOMAIN_SUFFIX).is_some() => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use actix_web::http::header::HeaderValue;
    use rstest::rstest;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://learnhub.example")]
    #[case("https://app.learnhub.example")]
    fn accepts_configured_origins(#[case] origin: &str) {
        let header = header(origin);
        assert!(validate_origin(&header).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("https://example.com")]
    #[case("wss://learnhub.example")]
    fn rejects_disallowed_origins(#[case] origin: &str) {
        let header = header(origin);
        let error = validate_origin(&header).expect_err("origin should be rejected");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn rejects_non_utf8_origin_header() {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let error = validate_origin(&header).expect_err("origin should be rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn rejects_unparsable_origin_header() {
        let header = HeaderValue::from_static("not a url");
        let error = validate_origin(&header).expect_err("origin should be rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case("http://localhost:4000", true)]
    #[case("http://localhost:0", false)]
    #[case("http://localhost", false)]
    #[case("https://learnhub.example", true)]
    #[case("https://chat.learnhub.example", true)]
    #[case("https://learnhub.example.evil.com", false)]
    #[case("wss://learnhub.example", false)]
    fn evaluates_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(is_allowed_origin(&parsed), expected);
    }
}
