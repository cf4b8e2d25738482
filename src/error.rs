use thiserror::Error;

/// Failures talking to the Canvas API. Loops log these and wait for their
/// next scheduled tick; nothing is retried early.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("canvas API returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode canvas response from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("canvas request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures delivering to the Telegram bot API. Logged per recipient; the
/// remaining recipients are still attempted.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("telegram request failed")]
    Transport(#[from] reqwest::Error),
}
