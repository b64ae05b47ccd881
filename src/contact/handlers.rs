use super::{ContactError, ContactSubmission, notify, store};
use crate::{
    AppState,
    request::{JsonOrForm, PeerAddr, client_ip, user_agent},
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, info, warn};

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

async fn process_submission(
    app_state: &AppState,
    submission: ContactSubmission,
    ip_address: String,
    user_agent: String,
) -> Result<i64, ContactError> {
    let contact = submission.validate().map_err(ContactError::Validation)?;

    let stored = contact.clone();
    let reference_id = app_state
        .db
        .run(move |conn| store::insert_contact(conn, &stored, &ip_address, &user_agent))
        .await?;

    let now = chrono::Local::now().naive_local();
    let (admin_subject, admin_body) = notify::admin_notification(&contact, reference_id, now);
    let (visitor_subject, visitor_body) =
        notify::visitor_confirmation(&contact, &app_state.config.app.name, now);

    let (to_admin, to_visitor) = tokio::join!(
        app_state
            .mailer
            .send(&app_state.config.contact.admin_email, &admin_subject, admin_body),
        app_state
            .mailer
            .send(&contact.email, &visitor_subject, visitor_body),
    );
    if let Err(e) = to_admin {
        error!("Failed to send notification email: {}", e);
    }
    if let Err(e) = to_visitor {
        error!("Failed to send confirmation email: {}", e);
    }

    Ok(reference_id)
}

pub async fn submit_contact_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    PeerAddr(peer): PeerAddr,
    JsonOrForm(submission): JsonOrForm<ContactSubmission>,
) -> Response {
    let ip_address = client_ip(&headers, peer, app_state.config.server.trust_forwarded_for);

    if !app_state.rate_limiter.check(&ip_address) {
        warn!("Contact form rate limit hit for {}", ip_address);
        return failure(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many submissions. Please try again in a minute.",
        );
    }

    let agent = user_agent(&headers).unwrap_or_default();
    match process_submission(&app_state, submission, ip_address, agent).await {
        Ok(reference_id) => {
            info!("Contact form submitted successfully. ID: {}", reference_id);
            Json(json!({
                "success": true,
                "message": "Thank you for your message! We'll get back to you soon.",
                "reference_id": reference_id,
            }))
            .into_response()
        }
        Err(ContactError::Validation(message)) => failure(StatusCode::BAD_REQUEST, &message),
        Err(e) => {
            error!("Error processing contact form: {}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred. Please try again later.",
            )
        }
    }
}

pub async fn contact_status_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match app_state.db.run(move |conn| store::contact_status(conn, id)).await {
        Ok(Some(status)) => Json(json!({
            "success": true,
            "submitted_at": status.submitted_at,
            "subject": status.subject,
            "status": "received",
        }))
        .into_response(),
        Ok(None) => failure(StatusCode::NOT_FOUND, "Contact submission not found"),
        Err(e) => {
            error!("Error checking contact status: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Error checking status")
        }
    }
}
