use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("D-Bus connection error: {0}")]
    Connect(#[source] BoxError),

    #[error("D-Bus call failed: {0}")]
    Call(#[source] BoxError),

    #[error("D-Bus reply has no arguments")]
    NoArguments,

    #[error("unexpected D-Bus reply type '{signature}'")]
    UnexpectedType { signature: String },

    #[error("failed to send D-Bus message: {0}")]
    Send(#[source] BoxError),

    #[error("{method} was already sent in this invocation")]
    AlreadySent { method: &'static str },
}

impl TransportError {
    pub fn connect(err: impl Into<BoxError>) -> Self {
        Self::Connect(err.into())
    }

    pub fn call(err: impl Into<BoxError>) -> Self {
        Self::Call(err.into())
    }

    pub fn send(err: impl Into<BoxError>) -> Self {
        Self::Send(err.into())
    }

    /// Could not reach the authority at all, as opposed to a bad exchange.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}
