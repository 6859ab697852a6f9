//! services/api/src/web/envelope.rs
//!
//! Every response body is wrapped as `{data, status, error}`:
//! `status` is `0` on success and `-1` on failure, and `error` is either
//! `null` or `{message}`.

use serde::Serialize;

pub const STATUS_OK: i32 = 0;
pub const STATUS_FAILED: i32 = -1;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub status: i32,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            status: STATUS_OK,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            status: STATUS_FAILED,
            error: Some(ErrorBody {
                message: message.into(),
            }),
        }
    }
}

impl Envelope<()> {
    /// A success with nothing to return (`data: null`).
    pub fn empty() -> Self {
        Self {
            data: None,
            status: STATUS_OK,
            error: None,
        }
    }
}
