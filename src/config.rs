use std::env;
use std::fmt;
use std::str::FromStr;

/// Webhook response mode for `POST /voice`.
///
/// Read from `WEBHOOK_MODE` at startup and immutable for the process
/// lifetime. Each mode selects one canned response used to exercise the
/// client's reaction to a different signaling outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookMode {
    /// Markup instructing immediate call rejection.
    #[default]
    Reject,
    /// HTTP 500 with a plain-text body, no markup.
    HttpError,
    /// HTTP 200 with deliberately malformed markup.
    InvalidTwiml,
    /// Spoken announcement followed by call termination.
    SayHangup,
}

impl WebhookMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookMode::Reject => "reject",
            WebhookMode::HttpError => "http-error",
            WebhookMode::InvalidTwiml => "invalid-twiml",
            WebhookMode::SayHangup => "say-hangup",
        }
    }
}

impl FromStr for WebhookMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(WebhookMode::Reject),
            "http-error" => Ok(WebhookMode::HttpError),
            "invalid-twiml" => Ok(WebhookMode::InvalidTwiml),
            "say-hangup" => Ok(WebhookMode::SayHangup),
            other => Err(format!(
                "Unknown webhook mode '{other}' (expected reject, http-error, invalid-twiml or say-hangup)"
            )),
        }
    }
}

impl fmt::Display for WebhookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // Signing credentials. All required; the process refuses to start
    // without them rather than issuing unsigned tokens.
    pub account_sid: String,
    pub auth_token: String,
    pub twiml_app_sid: String,
    pub api_key_sid: String,
    pub api_key_secret: String,

    pub webhook_mode: WebhookMode,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;

        let account_sid = require_env("TWILIO_ACCOUNT_SID")?;
        let auth_token = require_env("TWILIO_AUTH_TOKEN")?;
        let twiml_app_sid = require_env("TWILIO_TWIML_APP_SID")?;
        let api_key_sid = require_env("API_KEY_SID")?;
        let api_key_secret = require_env("API_KEY_SECRET")?;

        let webhook_mode = match env::var("WEBHOOK_MODE") {
            Ok(raw) => raw.parse::<WebhookMode>()?,
            Err(_) => WebhookMode::default(),
        };

        Ok(ServerConfig {
            host,
            port,
            account_sid,
            auth_token,
            twiml_app_sid,
            api_key_sid,
            api_key_secret,
            webhook_mode,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn require_env(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("Missing required environment variable: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_mode_parse() {
        assert_eq!("reject".parse::<WebhookMode>(), Ok(WebhookMode::Reject));
        assert_eq!(
            "http-error".parse::<WebhookMode>(),
            Ok(WebhookMode::HttpError)
        );
        assert_eq!(
            "invalid-twiml".parse::<WebhookMode>(),
            Ok(WebhookMode::InvalidTwiml)
        );
        assert_eq!(
            "say-hangup".parse::<WebhookMode>(),
            Ok(WebhookMode::SayHangup)
        );
    }

    #[test]
    fn test_webhook_mode_parse_unknown() {
        let result = "busy-signal".parse::<WebhookMode>();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("busy-signal"));
    }

    #[test]
    fn test_webhook_mode_default_is_reject() {
        assert_eq!(WebhookMode::default(), WebhookMode::Reject);
    }

    #[test]
    fn test_webhook_mode_as_str_round_trip() {
        for mode in [
            WebhookMode::Reject,
            WebhookMode::HttpError,
            WebhookMode::InvalidTwiml,
            WebhookMode::SayHangup,
        ] {
            assert_eq!(mode.as_str().parse::<WebhookMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_address() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            account_sid: "AC".to_string(),
            auth_token: "token".to_string(),
            twiml_app_sid: "AP".to_string(),
            api_key_sid: "SK".to_string(),
            api_key_secret: "secret".to_string(),
            webhook_mode: WebhookMode::Reject,
        };
        assert_eq!(config.address(), "127.0.0.1:3000");
    }
}
