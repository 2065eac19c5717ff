use thiserror::Error;

/// Failures talking to the document retriever.
#[derive(Error, Debug)]
pub enum RetrieveError {
    /// The connection was refused or closed before a response arrived
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Retriever request timed out")]
    Timeout,

    #[error("Retriever returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode retriever response: {0}")]
    Decode(String),

    #[error("No pipeline named '{name}' in project '{project}'")]
    PipelineNotFound { name: String, project: String },

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for RetrieveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RetrieveError::Timeout;
        }
        if err.is_decode() {
            return RetrieveError::Decode(err.to_string());
        }
        if err.is_connect() || closed_by_peer(&err) {
            return RetrieveError::Connection(err.to_string());
        }
        RetrieveError::Http(err)
    }
}

/// Walks the source chain looking for a sign that the socket went away.
///
/// hyper reports a peer that closes without answering as an incomplete
/// message, with no I/O error underneath.
fn closed_by_peer(err: &(dyn std::error::Error + 'static)) -> bool {
    use std::io::ErrorKind;

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Terminal outcome of one chat request.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Failed to initialize retriever: {0}")]
    Initialization(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    ConnectionInterrupted(String),

    #[error("{0}")]
    Upstream(String),
}

/// Configuration errors raised while reading the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set in the environment")]
    Missing(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}
