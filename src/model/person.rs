use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Staff category carried on every employee row. Security personnel are the
/// only category whose attendance window depends on a daily shift roster.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeRole {
    Teacher,
    Staff,
    Security,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Student {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "20240101")]
    pub student_no: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = 3)]
    pub class_id: u64,

    /// Guardian phone number, used for the attendance notification.
    #[schema(example = "081234567890", nullable = true)]
    pub guardian_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub code: String,

    #[schema(example = "John Doe")]
    pub name: String,

    pub role: EmployeeRole,

    /// Last-known shift label, kept only to prefill the roster editor.
    /// Window resolution always goes through the daily roster.
    #[schema(example = "shift1", nullable = true)]
    pub default_shift: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct SchoolClass {
    pub id: u64,
    #[schema(example = "7A")]
    pub name: String,
}

/// The person a QR payload resolved to.
#[derive(Debug, Clone)]
pub enum ScanTarget {
    Student(Student),
    Employee(Employee),
}

impl ScanTarget {
    pub fn name(&self) -> &str {
        match self {
            ScanTarget::Student(s) => &s.name,
            ScanTarget::Employee(e) => &e.name,
        }
    }

    /// Normalized prefixed code, the cache/filter key ("s20240101", "pemp-001").
    pub fn identity_code(&self) -> String {
        match self {
            ScanTarget::Student(s) => format!("s{}", s.student_no.to_lowercase()),
            ScanTarget::Employee(e) => format!("p{}", e.code.to_lowercase()),
        }
    }

    /// The bare identifier as stored in the attendance tables.
    pub fn person_key(&self) -> &str {
        match self {
            ScanTarget::Student(s) => &s.student_no,
            ScanTarget::Employee(e) => &e.code,
        }
    }
}

/// Which attendance table an operation works against. Replaces the dynamic
/// model/field pair the evaluator would otherwise have to thread around.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PersonScope {
    Students,
    Employees,
}

impl PersonScope {
    pub fn attendance_table(&self) -> &'static str {
        match self {
            PersonScope::Students => "student_attendance",
            PersonScope::Employees => "employee_attendance",
        }
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            PersonScope::Students => "student_no",
            PersonScope::Employees => "code",
        }
    }

    pub fn population_table(&self) -> &'static str {
        match self {
            PersonScope::Students => "students",
            PersonScope::Employees => "employees",
        }
    }
}
