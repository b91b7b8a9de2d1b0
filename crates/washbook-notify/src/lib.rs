//! WASHBOOK Notify — SendGrid-backed implementation of the core
//! [`Notifier`] trait.
//!
//! The auth pipeline only sees the trait; this crate owns the HTTP
//! plumbing and the SendGrid wire format.

use std::time::Duration;

use serde::Serialize;

use washbook_core::error::{WashbookError, WashbookResult};
use washbook_core::notify::{Notification, Notifier};

/// SendGrid settings, usually sourced from the environment by the
/// server binary.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub timeout_secs: u64,
}

impl NotifyConfig {
    pub fn from_env() -> WashbookResult<Self> {
        Ok(Self {
            api_key: require_env("SENDGRID_API_KEY")?,
            from_email: require_env("FROM_EMAIL")?,
            from_name: require_env("FROM_NAME")?,
            timeout_secs: 10,
        })
    }
}

fn require_env(var: &'static str) -> WashbookResult<String> {
    std::env::var(var).map_err(|_| WashbookError::Internal(format!("missing env var: {var}")))
}

/// Dispatches mail through the SendGrid v3 API.
#[derive(Clone)]
pub struct SendGridNotifier {
    http: reqwest::Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl SendGridNotifier {
    pub fn new(config: NotifyConfig) -> WashbookResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WashbookError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key: config.api_key,
            from_email: config.from_email,
            from_name: config.from_name,
        })
    }
}

impl Notifier for SendGridNotifier {
    async fn send(&self, notification: Notification) -> WashbookResult<()> {
        let body = SgMail {
            personalizations: vec![SgPersonalization {
                to: vec![SgEmail {
                    email: notification.to,
                    name: None,
                }],
                subject: Some(notification.subject),
            }],
            from: SgEmail {
                email: self.from_email.clone(),
                name: Some(self.from_name.clone()),
            },
            content: vec![SgContent {
                r#type: "text/html".into(),
                value: notification.html,
            }],
        };

        let res = self
            .http
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WashbookError::Delivery(e.to_string()))?;

        // SendGrid success = 202 Accepted.
        if res.status() == reqwest::StatusCode::ACCEPTED {
            tracing::debug!("email dispatched");
            Ok(())
        } else {
            let code = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            Err(WashbookError::Delivery(format!(
                "sendgrid failed: status={code} body={text}"
            )))
        }
    }
}

#[derive(Serialize)]
struct SgMail {
    personalizations: Vec<SgPersonalization>,
    from: SgEmail,
    content: Vec<SgContent>,
}

#[derive(Serialize)]
struct SgPersonalization {
    to: Vec<SgEmail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
}

#[derive(Serialize)]
struct SgEmail {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize)]
struct SgContent {
    #[serde(rename = "type")]
    r#type: String,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_body_matches_sendgrid_shape() {
        let body = SgMail {
            personalizations: vec![SgPersonalization {
                to: vec![SgEmail {
                    email: "to@example.com".into(),
                    name: None,
                }],
                subject: Some("Hello".into()),
            }],
            from: SgEmail {
                email: "noreply@washbook.app".into(),
                name: Some("Washbook".into()),
            },
            content: vec![SgContent {
                r#type: "text/html".into(),
                value: "<p>hi</p>".into(),
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "to@example.com");
        assert_eq!(json["content"][0]["type"], "text/html");
        // Absent optional fields are omitted, not null.
        assert!(json["personalizations"][0]["to"][0].get("name").is_none());
    }
}
