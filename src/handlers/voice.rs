//! Voice webhook handler.
//!
//! The signaling cloud POSTs here when an outbound call hits the configured
//! application. The response is one of four canned behaviors selected by the
//! process-wide webhook mode; the form fields are consumed for logging only
//! and never influence the branch taken.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::AppError;
use crate::config::WebhookMode;
use crate::state::AppState;
use crate::twiml::VoiceResponse;

/// Announcement spoken in `say-hangup` mode.
pub const SAY_HANGUP_TEXT: &str = "This call will be terminated.";

/// Form payload posted by the signaling cloud.
#[derive(Debug, Deserialize)]
pub struct VoiceWebhookForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,
}

/// Handler for POST /voice.
pub async fn voice_webhook(
    State(state): State<Arc<AppState>>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    info!(
        from = %form.from,
        to = %form.to,
        call_sid = %form.call_sid,
        "Voice webhook received"
    );

    let mode = state.config.webhook_mode;
    info!("Voice webhook mode: {mode}");

    match mode {
        WebhookMode::HttpError => {
            info!("Voice webhook returning HTTP 500 error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        WebhookMode::InvalidTwiml => {
            info!("Voice webhook returning invalid TwiML");
            xml_response("<Invalid>Not valid TwiML</Invalid>".to_string())
        }
        WebhookMode::SayHangup => {
            match VoiceResponse::new().say(SAY_HANGUP_TEXT).hangup().to_xml() {
                Ok(body) => {
                    info!("Voice webhook returning TwiML: {body}");
                    xml_response(body)
                }
                Err(e) => {
                    AppError::InternalServerError(format!("TwiML serialization failed: {e}"))
                        .into_response()
                }
            }
        }
        WebhookMode::Reject => match VoiceResponse::new().reject("rejected").to_xml() {
            Ok(body) => {
                info!("Voice webhook returning TwiML: {body}");
                xml_response(body)
            }
            Err(e) => AppError::InternalServerError(format!("TwiML serialization failed: {e}"))
                .into_response(),
        },
    }
}

fn xml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
