use crate::api::attendance::{EmployeeDayRow, OverrideReq, RecordCell, StudentDayRow};
use crate::api::class::ClassReq;
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::roster::{CopyPreviousReq, RosterView, SaveRosterReq};
use crate::api::scan::ScanForm;
use crate::api::settings::{CreateHoliday, WeeklyHolidaysReq, WindowForm, WindowsView};
use crate::api::student::{CreateStudent, StudentListResponse};
use crate::engine::error::{ScanReply, Severity};
use crate::engine::roster::RosterEntry;
use crate::engine::summary::{DailySummary, PeriodSummary, StatusCounts};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DayOverride, EntryKind};
use crate::model::calendar::Holiday;
use crate::model::person::{Employee, EmployeeRole, SchoolClass, Student};
use crate::model::window::AttendanceWindow;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SAMS API",
        version = "1.0.0",
        description = r#"
## School Attendance Management System

QR-scan attendance for students, teachers, staff, and security personnel,
evaluated against configurable time windows.

### Key Features
- **Scan evaluation**
  - Entry/late/exit classification with per-category windows
  - Security shifts resolved from a monthly roster
  - Weekly and dated holidays suppress evaluation
- **Administration**
  - Student, employee, and class management
  - Window, holiday, and roster configuration
  - Manual whole-day status overrides
- **Dashboards**
  - Daily and monthly per-population status counts

### Security
Administrative endpoints require **JWT Bearer authentication**; the scan
endpoint is public and rate limited for unattended kiosks.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::scan::submit_scan,

        crate::api::attendance::student_day_view,
        crate::api::attendance::employee_day_view,
        crate::api::attendance::override_student_day,
        crate::api::attendance::override_employee_day,

        crate::api::roster::month_view,
        crate::api::roster::save_roster,
        crate::api::roster::copy_previous,

        crate::api::settings::get_windows,
        crate::api::settings::put_student_window,
        crate::api::settings::put_staff_window,
        crate::api::settings::put_security_window,
        crate::api::settings::delete_security_window,
        crate::api::settings::get_weekly_holidays,
        crate::api::settings::put_weekly_holidays,
        crate::api::settings::list_holidays,
        crate::api::settings::create_holiday,
        crate::api::settings::delete_holiday,

        crate::api::dashboard::daily,
        crate::api::dashboard::period,

        crate::api::class::list_classes,
        crate::api::class::create_class,
        crate::api::class::update_class,
        crate::api::class::delete_class,

        crate::api::student::list_students,
        crate::api::student::create_student,
        crate::api::student::update_student,
        crate::api::student::delete_student,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
    ),
    components(
        schemas(
            ScanForm,
            ScanReply,
            Severity,
            AttendanceRecord,
            AttendanceStatus,
            EntryKind,
            DayOverride,
            RecordCell,
            StudentDayRow,
            EmployeeDayRow,
            OverrideReq,
            RosterView,
            RosterEntry,
            SaveRosterReq,
            CopyPreviousReq,
            WindowForm,
            WindowsView,
            AttendanceWindow,
            WeeklyHolidaysReq,
            CreateHoliday,
            Holiday,
            DailySummary,
            PeriodSummary,
            StatusCounts,
            ClassReq,
            SchoolClass,
            Student,
            CreateStudent,
            StudentListResponse,
            Employee,
            EmployeeRole,
            CreateEmployee,
            EmployeeListResponse,
        )
    ),
    tags(
        (name = "Scan", description = "QR scan evaluation"),
        (name = "Attendance", description = "Day views and manual overrides"),
        (name = "Roster", description = "Security shift roster administration"),
        (name = "Settings", description = "Windows and calendar exceptions"),
        (name = "Dashboard", description = "Daily and monthly statistics"),
        (name = "Classes", description = "Class management"),
        (name = "Students", description = "Student management"),
        (name = "Employees", description = "Employee management"),
    )
)]
pub struct ApiDoc;
