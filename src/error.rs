use serde::Serialize;
use thiserror::Error;

use crate::channels::ChannelLabel;
use crate::types::PlateId;

/// Whole-trial input failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoleCheckError {
    #[error("No {marker} marker data.")]
    MissingMarker { marker: String },

    #[error("{plate} does not seem to be available (no {label} channel).")]
    MissingChannel { plate: PlateId, label: ChannelLabel },

    #[error("No frame has every pole marker present.")]
    NoValidGeometryFrame,

    #[error("No {plate} COP data.")]
    NoActiveSamples { plate: PlateId },

    #[error("{what} has {actual} samples, expected {expected}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for pole check operations
pub type PoleResult<T> = Result<T, PoleCheckError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    Error,
    Warning,
}

/// User-facing message the caller shows before halting a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl PoleCheckError {
    pub fn notification(&self) -> Notification {
        Notification {
            kind: NotificationKind::Error,
            title: "ERROR".to_string(),
            message: self.to_string(),
        }
    }
}
