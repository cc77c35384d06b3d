use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Roster shift label ("shift1".."shift4"). "Off" and the empty string are
/// valid stored values but mean the person is not scheduled that day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ToSchema)]
#[display(fmt = "{}", _0)]
pub struct ShiftLabel(String);

impl ShiftLabel {
    pub fn new(label: impl Into<String>) -> Self {
        ShiftLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_off(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed.eq_ignore_ascii_case("off")
    }
}

impl From<String> for ShiftLabel {
    fn from(label: String) -> Self {
        ShiftLabel(label)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ShiftAssignment {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "shift2")]
    pub shift: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_and_blank_labels_are_unscheduled() {
        assert!(ShiftLabel::new("Off").is_off());
        assert!(ShiftLabel::new("off").is_off());
        assert!(ShiftLabel::new("  ").is_off());
        assert!(ShiftLabel::new("").is_off());
        assert!(!ShiftLabel::new("shift1").is_off());
    }
}
