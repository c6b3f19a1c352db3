#[derive(Debug, thiserror::Error)]
pub enum NewsApiError {
    #[error("missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
}

pub type Result<T> = std::result::Result<T, NewsApiError>;
