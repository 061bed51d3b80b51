use http::{HeaderMap, StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type JsonResult<T> = std::result::Result<T, JsonError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON handling failed : {0}")]
    Json(#[from] JsonError),
    #[error("bad OAuth response : {0}")]
    BadOAuthResponse(#[from] TokenReaderError),
    #[error("cannot find bearer token in server response : {0}")]
    InvalidBearerToken(String),
    #[error("cannot find JSON dictionary in response")]
    InvalidJsonResponse,
    #[error("bearer tokens belong to application-only clients")]
    NotAppOnly,
    #[error("server reported error {code} : {message}")]
    Response { code: i64, message: String },
    #[error("{message}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        error_code: Option<i64>,
        message: String,
    },
    #[error("request failed : {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid url : {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid header value : {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl Error {
    /// HTTP status of a non-2xx response.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Numeric error code reported by the server, if any.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Error::Status { error_code, .. } => *error_code,
            Error::Response { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("malformed JSON : {0}")]
    Parse(#[from] serde_json::Error),
    #[error("an invalid value cannot be serialized")]
    InvalidValue,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("request token carries no oauth_verifier")]
    MissingVerifier,
    #[error("response body is not valid UTF-8")]
    NotUtf8,
}
