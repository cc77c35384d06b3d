use chrono::NaiveTime;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::shift::ShiftLabel;

/// Time-of-day window a scan is classified against. No date component;
/// the roster and calendar decide which window applies on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceWindow {
    #[schema(example = "07:00:00", value_type = String)]
    pub entry_open: NaiveTime,

    #[schema(example = "07:30:00", value_type = String)]
    pub entry_close: NaiveTime,

    /// Latest time-of-day still accepted as a (late) entry.
    #[schema(example = "08:00:00", value_type = String, nullable = true)]
    pub late_cutoff: Option<NaiveTime>,

    #[schema(example = "13:00:00", value_type = String)]
    pub exit_open: NaiveTime,

    #[schema(example = "14:00:00", value_type = String)]
    pub exit_close: NaiveTime,
}

/// Which configured window a lookup was after; carried on ConfigMissing
/// rejections so the operator message can say what is unconfigured.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum WindowCategory {
    #[display(fmt = "student")]
    Student,
    #[display(fmt = "teacher/staff")]
    Staff,
    #[display(fmt = "security shift {}", _0)]
    SecurityShift(ShiftLabel),
}
