//! Request Error Taxonomy

use std::{io, path::PathBuf};

use actix_web::{
    HttpResponse, ResponseError,
    http::{StatusCode, header},
    mime,
};
use derive_more::{Display, Error};

use crate::auth::LOGIN_PATH;

/// Every failure a request can run into once it reaches the core.
///
/// Filesystem errors are translated into one of these kinds at the
/// component boundary, so raw OS messages never reach the client.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ServeError {
    /// Request path would resolve outside of the served root.
    #[display("path escapes the served root")]
    PathEscape,

    /// Target does not exist or is not the expected kind of file.
    #[display("not found")]
    NotFound,

    /// Operating system denied access to the target.
    #[display("permission denied")]
    Permission,

    /// Writing an uploaded part failed.
    #[display("failed to write upload {path:?}")]
    Write { path: PathBuf, source: io::Error },

    /// Multipart body was malformed or carried an unusable filename.
    #[display("invalid upload: {_0}")]
    InvalidUpload(#[error(not(source))] String),

    /// Upload body exceeded the configured limit.
    #[display("upload exceeds limit of {limit} bytes")]
    UploadTooLarge { limit: usize },

    /// Request carries no valid session.
    #[display("authentication required")]
    AuthRequired,

    /// Any other I/O failure.
    #[display("internal error")]
    Internal(io::Error),
}

impl From<io::Error> for ServeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::Permission,
            _ => Self::Internal(err),
        }
    }
}

impl ResponseError for ServeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PathEscape | Self::NotFound | Self::Permission => StatusCode::NOT_FOUND,
            Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AuthRequired => StatusCode::FOUND,
            Self::Write { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if let Self::AuthRequired = self {
            return HttpResponse::build(status)
                .insert_header((header::LOCATION, LOGIN_PATH))
                .finish();
        }
        match self {
            Self::Write { path, source } => log::error!("upload write {path:?} failed: {source}"),
            Self::Internal(err) => log::error!("request failed: {err}"),
            _ => {}
        }
        HttpResponse::build(status)
            .insert_header(header::ContentType(mime::TEXT_PLAIN_UTF_8))
            .body(status.canonical_reason().unwrap_or("Error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified() {
        let err = ServeError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ServeError::NotFound));
        let err = ServeError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ServeError::Permission));
        let err = ServeError::from(io::Error::other("disk on fire"));
        assert!(matches!(err, ServeError::Internal(_)));
    }

    #[test]
    fn access_failures_look_identical() {
        for err in [ServeError::PathEscape, ServeError::NotFound, ServeError::Permission] {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn auth_required_redirects_to_login() {
        let res = ServeError::AuthRequired.error_response();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), LOGIN_PATH);
    }
}
