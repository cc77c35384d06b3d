use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::engine::calendar::HolidayReason;
use crate::model::attendance::EntryKind;
use crate::model::window::WindowCategory;

/// Every way a scan can fail to produce a record. All variants are recovered
/// at the HTTP boundary and rendered as a `ScanReply`; none crash the process.
#[derive(Debug, Error)]
pub enum Reject {
    #[error("{0}")]
    InvalidPayload(&'static str),

    #[error("No {scope} matching {identifier} was found.")]
    UnknownIdentity {
        scope: &'static str,
        identifier: String,
    },

    #[error("Attendance is not recorded today: {0}.")]
    HolidaySuppressed(HolidayReason),

    #[error("No attendance window is configured for {0}. Contact the administrator.")]
    ConfigMissing(WindowCategory),

    #[error("No shift is scheduled for this security employee today.")]
    ShiftUnscheduled,

    #[error("Not a valid attendance time right now.")]
    OutsideWindow,

    #[error("{name} already recorded {kind} attendance today.")]
    AlreadyRecorded { name: String, kind: EntryKind },

    #[error("Failed to save the attendance record.")]
    Persistence(#[from] sqlx::Error),
}

impl Reject {
    /// A duplicate scan is a shrug, not a fault: the person needs no
    /// corrective action, so it renders as a warning instead of an error.
    pub fn severity(&self) -> Severity {
        match self {
            Reject::AlreadyRecorded { .. } => Severity::Warning,
            _ => Severity::Danger,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

/// The `{status, message}` envelope every scan submission resolves to.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanReply {
    pub status: Severity,
    #[schema(example = "Recorded entry attendance (on time).")]
    pub message: String,
}

impl ScanReply {
    pub fn success(message: impl Into<String>) -> Self {
        ScanReply {
            status: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ScanReply {
            status: Severity::Warning,
            message: message.into(),
        }
    }
}

impl From<&Reject> for ScanReply {
    fn from(reject: &Reject) -> Self {
        ScanReply {
            status: reject.severity(),
            message: reject.to_string(),
        }
    }
}
