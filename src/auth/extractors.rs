use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::CallerId;
use crate::error::AppError;

/// Name of the path segment carrying the owner id on task routes.
pub const OWNER_PATH_PARAM: &str = "owner_id";

/// The authenticated caller, checked against the owner id in the path.
///
/// `AuthMiddleware` must run first and leave a [`CallerId`] in the request
/// extensions; without it the extractor answers 401. When the route has an
/// `{owner_id}` segment that differs from the caller, it answers 403: the
/// caller asserted someone else's id themselves, so nothing is revealed.
#[derive(Debug, Clone)]
pub struct AuthorizedOwner(pub CallerId);

impl AuthorizedOwner {
    pub fn caller(&self) -> &CallerId {
        &self.0
    }
}

fn authorize(req: &HttpRequest) -> Result<AuthorizedOwner, AppError> {
    let caller = req
        .extensions()
        .get::<CallerId>()
        .cloned()
        .ok_or(AppError::Unauthenticated)?;

    if let Some(path_owner) = req.match_info().get(OWNER_PATH_PARAM) {
        if path_owner != caller.as_str() {
            log::warn!(
                "Caller {} addressed tasks of {} on {}",
                caller,
                path_owner,
                req.path()
            );
            return Err(AppError::Forbidden(path_owner.to_string()));
        }
    }

    Ok(AuthorizedOwner(caller))
}

impl FromRequest for AuthorizedOwner {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn request_for(owner_in_path: &str) -> HttpRequest {
        test::TestRequest::default()
            .param(OWNER_PATH_PARAM, owner_in_path.to_string())
            .to_http_request()
    }

    #[actix_rt::test]
    async fn test_matching_owner_is_authorized() {
        let req = request_for("usr_a");
        req.extensions_mut().insert(CallerId::new("usr_a".into()));

        let mut payload = Payload::None;
        let owner = AuthorizedOwner::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(owner.caller().as_str(), "usr_a");
    }

    #[actix_rt::test]
    async fn test_mismatched_owner_is_forbidden() {
        let req = request_for("usr_b");
        req.extensions_mut().insert(CallerId::new("usr_a".into()));

        let mut payload = Payload::None;
        let err = AuthorizedOwner::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn test_missing_caller_is_unauthorized() {
        let req = request_for("usr_a");

        let mut payload = Payload::None;
        let err = AuthorizedOwner::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
