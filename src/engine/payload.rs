use crate::engine::error::Reject;

/// Which population a QR payload addresses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PayloadKind {
    Student,
    Employee,
}

/// A parsed QR payload: single-character category prefix (`s` student,
/// `p` employee) followed by the identifier, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPayload {
    pub kind: PayloadKind,
    pub identifier: String,
}

impl ScanPayload {
    pub fn parse(raw: &str) -> Result<Self, Reject> {
        let normalized = raw.trim().to_lowercase();
        let mut chars = normalized.chars();
        let (Some(prefix), Some(_)) = (chars.next(), chars.next()) else {
            return Err(Reject::InvalidPayload("QR payload is too short."));
        };
        let identifier = normalized[prefix.len_utf8()..].to_string();

        let kind = match prefix {
            's' => PayloadKind::Student,
            'p' => PayloadKind::Employee,
            _ => {
                return Err(Reject::InvalidPayload(
                    "Unrecognized QR payload. Use the S<id> or P<id> format.",
                ));
            }
        };

        Ok(ScanPayload { kind, identifier })
    }

    /// Normalized prefixed form, used as the cache and filter key.
    pub fn code(&self) -> String {
        let prefix = match self.kind {
            PayloadKind::Student => 's',
            PayloadKind::Employee => 'p',
        };
        format!("{prefix}{}", self.identifier)
    }

    pub fn scope_word(&self) -> &'static str {
        match self.kind {
            PayloadKind::Student => "student",
            PayloadKind::Employee => "employee",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_student_and_employee_prefixes_case_insensitively() {
        let payload = ScanPayload::parse("S20240101").unwrap();
        assert_eq!(payload.kind, PayloadKind::Student);
        assert_eq!(payload.identifier, "20240101");

        let payload = ScanPayload::parse("PEMP-007").unwrap();
        assert_eq!(payload.kind, PayloadKind::Employee);
        assert_eq!(payload.identifier, "emp-007");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let payload = ScanPayload::parse("  s123  ").unwrap();
        assert_eq!(payload.identifier, "123");
        assert_eq!(payload.code(), "s123");
    }

    #[test]
    fn rejects_short_payloads() {
        assert!(matches!(
            ScanPayload::parse("s"),
            Err(Reject::InvalidPayload(_))
        ));
        assert!(matches!(
            ScanPayload::parse("  "),
            Err(Reject::InvalidPayload(_))
        ));
    }

    #[test]
    fn rejects_unknown_prefixes() {
        assert!(matches!(
            ScanPayload::parse("x1234"),
            Err(Reject::InvalidPayload(_))
        ));
    }
}
