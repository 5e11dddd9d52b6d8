use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use smo_core::{Actor, AppError};

use crate::error::ApiResult;

/// Header carrying the operator login on state-changing requests.
pub const ACTOR_LOGIN_HEADER: &str = "x-smo-user";
/// Optional header carrying the operator display name.
pub const ACTOR_NAME_HEADER: &str = "x-smo-user-name";

pub async fn require_actor(mut request: Request, next: Next) -> ApiResult<Response> {
    let actor = actor_from_headers(request.headers())?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let login = header_text(headers, ACTOR_LOGIN_HEADER).ok_or_else(|| {
        AppError::Validation(format!("{ACTOR_LOGIN_HEADER} header is required"))
    })?;

    Actor::new(login, header_text(headers, ACTOR_NAME_HEADER))
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::{ACTOR_LOGIN_HEADER, ACTOR_NAME_HEADER, actor_from_headers};

    #[test]
    fn actor_is_read_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_LOGIN_HEADER, HeaderValue::from_static("joana.s"));
        headers.insert(ACTOR_NAME_HEADER, HeaderValue::from_static("Joana Souza"));

        let actor = actor_from_headers(&headers).unwrap_or_else(|_| unreachable!());
        assert_eq!(actor.login(), "joana.s");
        assert_eq!(actor.display_name(), "Joana Souza");
    }

    #[test]
    fn missing_or_blank_login_is_rejected() {
        assert!(actor_from_headers(&HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_LOGIN_HEADER, HeaderValue::from_static("  "));
        assert!(actor_from_headers(&headers).is_err());
    }
}
