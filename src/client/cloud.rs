//! Simulated signaling cloud.
//!
//! Stands in for the vendor cloud so the whole loop runs in-process:
//! registration succeeds once the access token decodes to an identity, and
//! an outbound call POSTs the voice webhook, then replays the answered
//! TwiML as the call lifecycle events a real SDK would deliver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::ClientError;
use super::device::{
    CallEvent, CallHandle, CallSession, DeviceEvent, DeviceHandle, DeviceOptions, DeviceSession,
    SignalError, SignalingBackend,
};
use crate::twiml::{self, Verb};

/// Generic catch-all signaling error code.
const ERROR_GENERAL: u32 = 31000;
/// Precise code for webhook transport failures (HTTP error or unreachable).
const ERROR_CONNECTION: u32 = 31005;
/// Precise code for malformed webhook markup.
const ERROR_MALFORMED_MARKUP: u32 = 31100;

#[derive(Debug, Deserialize)]
struct TokenGrants {
    identity: String,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    grants: TokenGrants,
}

/// Backend that drives the harness's own voice webhook.
pub struct SimulatedCloud {
    voice_url: String,
    http: reqwest::Client,
}

impl SimulatedCloud {
    pub fn new(voice_url: impl Into<String>) -> Self {
        Self {
            voice_url: voice_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

/// Recover the granted identity from the JWT payload without verifying the
/// signature; the simulation needs the claim, not trust in it.
fn identity_from_token(token: &str) -> Result<String, ClientError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::MalformedToken("not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ClientError::MalformedToken(e.to_string()))?;
    let claims: TokenClaims =
        serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedToken(e.to_string()))?;
    Ok(claims.grants.identity)
}

#[async_trait]
impl SignalingBackend for SimulatedCloud {
    async fn create_device(
        &self,
        token: &str,
        options: DeviceOptions,
    ) -> Result<DeviceSession, ClientError> {
        let identity = identity_from_token(token)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let device = SimulatedDevice {
            identity,
            voice_url: self.voice_url.clone(),
            http: self.http.clone(),
            options,
            events: tx.clone(),
            destroyed: Arc::new(AtomicBool::new(false)),
        };

        // Registration round trip, confirmed asynchronously.
        let destroyed = device.destroyed.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if !destroyed.load(Ordering::Acquire) {
                let _ = tx.send(DeviceEvent::Registered);
            }
        });

        Ok(DeviceSession {
            handle: Box::new(device),
            events: rx,
        })
    }
}

struct SimulatedDevice {
    identity: String,
    voice_url: String,
    http: reqwest::Client,
    options: DeviceOptions,
    events: mpsc::UnboundedSender<DeviceEvent>,
    destroyed: Arc<AtomicBool>,
}

#[async_trait]
impl DeviceHandle for SimulatedDevice {
    async fn connect(&self) -> Result<CallSession, ClientError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(ClientError::DeviceDestroyed);
        }

        let call_sid = format!("CA{}", Uuid::new_v4().simple());
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));

        let handle = SimulatedCall {
            events: tx.clone(),
            active: active.clone(),
        };

        let webhook = WebhookCall {
            http: self.http.clone(),
            voice_url: self.voice_url.clone(),
            from: format!("client:{}", self.identity),
            call_sid: call_sid.clone(),
            precise_errors: self.options.improved_signaling_error_precision,
            events: tx,
            active,
        };
        tokio::spawn(webhook.run());

        Ok(CallSession {
            call_sid,
            handle: Box::new(handle),
            events: rx,
        })
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            let _ = self.events.send(DeviceEvent::Unregistered);
        }
    }
}

struct SimulatedCall {
    events: mpsc::UnboundedSender<CallEvent>,
    active: Arc<AtomicBool>,
}

impl CallHandle for SimulatedCall {
    fn disconnect(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            let _ = self.events.send(CallEvent::Disconnect);
        }
    }
}

/// One webhook round trip plus the playback of its TwiML answer.
struct WebhookCall {
    http: reqwest::Client,
    voice_url: String,
    from: String,
    call_sid: String,
    precise_errors: bool,
    events: mpsc::UnboundedSender<CallEvent>,
    active: Arc<AtomicBool>,
}

impl WebhookCall {
    async fn run(self) {
        let params = [
            ("From", self.from.as_str()),
            ("To", ""),
            ("CallSid", self.call_sid.as_str()),
        ];

        let response = match self.http.post(&self.voice_url).form(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                self.fail(
                    ERROR_CONNECTION,
                    "ConnectionError",
                    format!("Webhook request failed: {e}"),
                );
                return;
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            self.fail(
                ERROR_CONNECTION,
                "ConnectionError",
                format!("Webhook returned HTTP {status}"),
            );
            return;
        }

        let twiml = match twiml::parse(&body) {
            Ok(t) => t,
            Err(e) => {
                self.fail(
                    ERROR_MALFORMED_MARKUP,
                    "MalformedResponseError",
                    format!("Webhook returned malformed TwiML: {e}"),
                );
                return;
            }
        };

        let mut accepted = false;
        for verb in twiml.verbs() {
            if !self.active.load(Ordering::Acquire) {
                // Client hung up mid-playback
                return;
            }
            match verb {
                Verb::Reject { reason } => {
                    debug!(call_sid = %self.call_sid, %reason, "Simulated cloud rejecting call");
                    self.terminate(CallEvent::Reject);
                    return;
                }
                Verb::Say(text) => {
                    self.accept_once(&mut accepted);
                    debug!(call_sid = %self.call_sid, %text, "Simulated cloud speaking announcement");
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                Verb::Hangup => {
                    self.accept_once(&mut accepted);
                    self.terminate(CallEvent::Disconnect);
                    return;
                }
            }
        }

        // No terminating verb: the call connects and stays up until the
        // client hangs up.
        self.accept_once(&mut accepted);
    }

    fn accept_once(&self, accepted: &mut bool) {
        if !*accepted {
            *accepted = true;
            let _ = self.events.send(CallEvent::Accept);
        }
    }

    fn terminate(&self, event: CallEvent) {
        if self.active.swap(false, Ordering::AcqRel) {
            let _ = self.events.send(event);
        }
    }

    fn fail(&self, code: u32, name: &str, message: String) {
        let (code, name) = if self.precise_errors {
            (code, name)
        } else {
            (ERROR_GENERAL, "GeneralError")
        };
        if self.active.swap(false, Ordering::AcqRel) {
            let _ = self.events.send(CallEvent::Error(SignalError {
                code,
                name: name.to_string(),
                message,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_token(payload_json: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_identity_from_token() {
        let token = fake_token(r#"{"grants":{"identity":"test-user-42-0"}}"#);
        assert_eq!(identity_from_token(&token).unwrap(), "test-user-42-0");
    }

    #[test]
    fn test_identity_from_token_rejects_non_jwt() {
        assert!(matches!(
            identity_from_token("not-a-jwt"),
            Err(ClientError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_identity_from_token_rejects_missing_grants() {
        let token = fake_token(r#"{"sub":"AC123"}"#);
        assert!(matches!(
            identity_from_token(&token),
            Err(ClientError::MalformedToken(_))
        ));
    }
}
