use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::engine::error::ScanReply;
use crate::engine::evaluate::{self, Evaluation};
use crate::model::person::ScanTarget;
use crate::utils::notify::{self, Notifier};
use crate::utils::phone::format_phone;

#[derive(Deserialize, ToSchema)]
pub struct ScanForm {
    /// Raw QR payload from the scanner widget.
    pub qr_data: Option<String>,
    /// Fallback field used by the manual-entry input.
    pub identifier: Option<String>,
}

/// Scan submission endpoint
#[utoipa::path(
    post,
    path = "/scan/submit",
    request_body(content = ScanForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Evaluation outcome; status is success, warning, or danger", body = ScanReply)
    ),
    tag = "Scan"
)]
pub async fn submit_scan(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    form: web::Form<ScanForm>,
) -> impl Responder {
    let raw = form
        .qr_data
        .as_deref()
        .or(form.identifier.as_deref())
        .unwrap_or("");

    if raw.trim().is_empty() {
        return HttpResponse::Ok().json(ScanReply {
            status: crate::engine::error::Severity::Danger,
            message: "QR data missing.".to_string(),
        });
    }

    let now = Local::now().naive_local();

    let evaluation = match evaluate::evaluate(pool.get_ref(), raw, now).await {
        Ok(evaluation) => evaluation,
        Err(reject) => {
            info!(%reject, "scan rejected");
            return HttpResponse::Ok().json(ScanReply::from(&reject));
        }
    };

    let base = format!(
        "{} recorded {} attendance ({}).",
        evaluation.target.name(),
        evaluation.kind.human_label(),
        evaluation.status.human_label(),
    );

    // The attendance write is already committed; the guardian message is a
    // single best-effort attempt whose failure only downgrades the reply.
    let reply = match guardian_phone(&evaluation) {
        Some(phone) if notifier.enabled() => {
            let message = notify::guardian_message(
                evaluation.target.name(),
                evaluation.kind,
                evaluation.status,
                evaluation.time,
            );
            match notifier.send(&format_phone(phone), &message).await {
                Ok(()) => ScanReply::success(format!("{base} Guardian notified.")),
                Err(e) => {
                    warn!(error = %e, "guardian notification failed");
                    ScanReply::warning(format!("{base} Guardian notification failed."))
                }
            }
        }
        _ => ScanReply::success(base),
    };

    HttpResponse::Ok().json(reply)
}

fn guardian_phone(evaluation: &Evaluation) -> Option<&str> {
    match &evaluation.target {
        ScanTarget::Student(student) => student.guardian_phone.as_deref(),
        ScanTarget::Employee(_) => None,
    }
}
