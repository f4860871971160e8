//! Resend email API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use leadline_shared::{EmailSettings, LeadlineError, Result};

use crate::{EmailSender, OutgoingEmail};

const USER_AGENT: &str = concat!("leadline/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// [`EmailSender`] that posts to Resend's `/emails` endpoint.
#[derive(Debug, Clone)]
pub struct ResendClient {
    http: Client,
    settings: EmailSettings,
}

impl ResendClient {
    pub fn new(settings: EmailSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LeadlineError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.settings.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    #[instrument(skip_all, fields(to = %self.settings.to))]
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>> {
        let body = SendRequest {
            from: &self.settings.from,
            to: [self.settings.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LeadlineError::Notification(format!("POST emails: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LeadlineError::Notification(format!(
                "POST emails: HTTP {status}: {text}"
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| LeadlineError::Notification(format!("POST emails: bad response: {e}")))?;
        debug!(id = ?parsed.id, "email accepted");
        Ok(parsed.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};

    fn client(server: &wiremock::MockServer) -> ResendClient {
        let settings = EmailSettings::new(
            &server.uri(),
            "re_test",
            "Forms <forms@example.com>",
            "advisor@example.com",
        )
        .unwrap();
        ResendClient::new(settings).unwrap()
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            subject: "New Contact Inquiry: Jane Doe".into(),
            html: "<p>hi</p>".into(),
        }
    }

    #[tokio::test]
    async fn posts_with_bearer_auth_and_fixed_recipient() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(json!({
                "from": "Forms <forms@example.com>",
                "to": ["advisor@example.com"],
                "subject": "New Contact Inquiry: Jane Doe",
                "html": "<p>hi</p>"
            })))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({ "id": "em_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).send(&email()).await.unwrap();
        assert_eq!(id.as_deref(), Some("em_1"));
    }

    #[tokio::test]
    async fn rejection_is_a_notification_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(wiremock::ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let err = client(&server).send(&email()).await.unwrap_err();
        assert!(matches!(err, LeadlineError::Notification(_)));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("422"));
    }
}
