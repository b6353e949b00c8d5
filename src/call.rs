//! Outbound reminder calls through the Twilio REST API.
//!
//! The rendered document is sent inline (`Twiml` parameter), so the
//! answered call plays the reminder without fetching the webhook.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::TwilioConfig;
use crate::twiml::VoiceDocument;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("missing telephony setting: {0}")]
    MissingSetting(&'static str),
    #[error("request to telephony API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telephony API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected telephony API response: {0}")]
    Response(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct CallResponse {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct TwilioCaller {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

impl TwilioCaller {
    pub fn new(config: &TwilioConfig) -> Result<Self, CallError> {
        let required = [
            ("account_sid", &config.account_sid),
            ("auth_token", &config.auth_token),
            ("from_number", &config.from_number),
        ];
        if let Some((name, _)) = required.into_iter().find(|(_, v)| v.is_empty()) {
            return Err(CallError::MissingSetting(name));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.account_sid
        )
    }

    fn call_params<'a>(
        &'a self,
        to: &'a str,
        doc: &'a VoiceDocument,
    ) -> [(&'static str, &'a str); 3] {
        [
            ("To", to),
            ("From", self.from_number.as_str()),
            ("Twiml", doc.as_str()),
        ]
    }

    /// Place a call to `to` that plays `doc`. Returns the call SID.
    pub async fn place_call(&self, to: &str, doc: &VoiceDocument) -> Result<String, CallError> {
        if to.is_empty() {
            return Err(CallError::MissingSetting("to_number"));
        }

        let url = self.calls_url();
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.call_params(to, doc))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CallError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let call: CallResponse = serde_json::from_str(&body)?;
        info!(
            "Call placed to {to}: sid={} status={}",
            call.sid,
            call.status.as_deref().unwrap_or("unknown")
        );
        Ok(call.sid)
    }
}
