//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::headers::{self, Header, HeaderMapExt as _};
use http::header::{HeaderName, HeaderValue};
use service::domain::user;
use uuid::Uuid;

use crate::{define_error, Error, JuniperResponse, Service};

/// Application context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Error status code.
    error_status_code: AtomicU16,

    /// Headers of the HTTP request.
    headers: http::HeaderMap,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the error status code of this [`Context`].
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Returns ID of the user acting in the current HTTP request, if any.
    ///
    /// # Errors
    ///
    /// If the [`UserIdHeader`] is malformed.
    pub fn current_user(&self) -> Result<Option<user::Id>, Error> {
        self.headers
            .typed_try_get::<UserIdHeader>()
            .map(|h| h.map(|UserIdHeader(id)| id))
            .map_err(|_| AuthError::InvalidUserId.into())
            .map_err(self.error())
    }

    /// Returns ID of the user acting in the current HTTP request.
    ///
    /// # Errors
    ///
    /// If the [`UserIdHeader`] is missing or malformed.
    pub fn required_user(&self) -> Result<user::Id, Error> {
        self.current_user()?
            .ok_or_else(|| AuthError::AuthorizationRequired.into())
            .map_err(self.error())
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse::failed(Error::internal(
                    &"missing `Service` extension",
                ))
            })?;

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            headers: parts.headers.clone(),
        })
    }
}

/// `X-User-Id` header carrying ID of the acting user, as set by the upstream
/// authentication gateway.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserIdHeader(pub user::Id);

/// Name of the [`UserIdHeader`].
static USER_ID: HeaderName = HeaderName::from_static("x-user-id");

impl Header for UserIdHeader {
    fn name() -> &'static HeaderName {
        &USER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        values
            .next()
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<Uuid>().ok())
            .map(|id| Self(id.into()))
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E>(&self, values: &mut E)
    where
        E: Extend<HeaderValue>,
    {
        values.extend(HeaderValue::from_str(&self.0.to_string()).ok());
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_USER_ID"]
        #[status = BAD_REQUEST]
        #[message = "`X-User-Id` header is not a valid user ID"]
        InvalidUserId,
    }
}

#[cfg(test)]
mod spec {
    use axum_extra::headers::HeaderMapExt as _;
    use service::domain::user;

    use super::UserIdHeader;

    #[test]
    fn decodes_user_id() {
        let id = user::Id::new();
        let mut headers = http::HeaderMap::new();
        headers.typed_insert(UserIdHeader(id));

        assert_eq!(
            headers.typed_try_get::<UserIdHeader>().unwrap(),
            Some(UserIdHeader(id)),
        );
    }

    #[test]
    fn missing_user_id() {
        let headers = http::HeaderMap::new();

        assert_eq!(headers.typed_try_get::<UserIdHeader>().unwrap(), None);
    }

    #[test]
    fn rejects_malformed_user_id() {
        let mut headers = http::HeaderMap::new();
        drop(headers.insert("x-user-id", "not-a-uuid".parse().unwrap()));

        assert!(headers.typed_try_get::<UserIdHeader>().is_err());
    }
}
