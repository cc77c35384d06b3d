use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Whether a record represents arrival, departure, or an administrative
/// whole-day entry (sick/leave/absent overrides).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    Entry,
    Exit,
    Other,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    Sick,
    Leave,
    Absent,
}

impl EntryKind {
    pub fn human_label(&self) -> &'static str {
        match self {
            EntryKind::Entry => "entry",
            EntryKind::Exit => "exit",
            EntryKind::Other => "attendance",
        }
    }
}

impl AttendanceStatus {
    pub fn human_label(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "on time",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Leave => "leave",
            AttendanceStatus::Absent => "absent",
        }
    }
}

/// Manual whole-day override an administrator can apply. `Present` is not a
/// stored status: it synthesizes an on-time entry/exit pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayOverride {
    Present,
    Sick,
    Leave,
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,

    /// Student number or employee code, depending on the table queried.
    #[schema(example = "20240101")]
    pub person_key: String,

    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "07:12:30", value_type = String)]
    pub time: NaiveTime,

    pub kind: EntryKind,

    pub status: AttendanceStatus,

    #[schema(nullable = true)]
    pub note: Option<String>,
}
