use thiserror::Error;

/// Failures while extracting an uplink event from a message body.
///
/// Partial or malformed telemetry is common on a shared bus; any of these
/// drops the current message and nothing more. None of them may stop the
/// listener.
#[derive(Debug, Error)]
pub enum MalformedUplink {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message body is not a JSON object")]
    NotAnObject,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unexpected type for field: {0}")]
    WrongType(&'static str),

    #[error("rxInfo contains no gateway receptions")]
    NoReceptions,
}

/// Downlink payload validation failure. Aborts the publish for the current
/// message only.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload out of range: value {value} at index {index} does not fit in a byte")]
    PayloadOutOfRange { index: usize, value: i64 },
}
