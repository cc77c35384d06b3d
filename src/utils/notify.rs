use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::model::attendance::{AttendanceStatus, EntryKind};

/// One-shot guardian notification over the WhatsApp gateway. Callers invoke
/// it strictly after the attendance transaction commits and swallow any
/// failure into a warning; nothing here can undo an attendance write.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl Notifier {
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.wa_timeout_secs))
            .build()
            .unwrap_or_default();

        Notifier {
            client,
            api_url: config.wa_api_url.clone(),
            token: config.wa_api_token.clone(),
        }
    }

    /// Disabled until a gateway token is configured.
    pub fn enabled(&self) -> bool {
        !self.token.is_empty()
    }

    pub async fn send(&self, target: &str, message: &str) -> Result<()> {
        let mut form = HashMap::new();
        form.insert("target", target);
        form.insert("message", message);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", &self.token)
            .form(&form)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("gateway responded with {}", response.status()))
        }
    }
}

/// The guardian-facing message body for a recorded scan.
pub fn guardian_message(
    name: &str,
    kind: EntryKind,
    status: AttendanceStatus,
    clock: chrono::NaiveTime,
) -> String {
    let kind_word = kind.human_label();
    let status_word = status.human_label();

    format!(
        "School attendance notice: {name} recorded *{kind_word}* attendance \
         with status *{status_word}* at {clock}.",
        clock = clock.format("%H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn message_carries_name_kind_status_and_clock() {
        let message = guardian_message(
            "Jane Doe",
            EntryKind::Entry,
            AttendanceStatus::Late,
            NaiveTime::from_hms_opt(7, 45, 12).unwrap(),
        );
        assert!(message.contains("Jane Doe"));
        assert!(message.contains("*entry*"));
        assert!(message.contains("*late*"));
        assert!(message.contains("07:45:12"));
    }
}
