use std::time::Duration;

use serde::Deserialize;

use super::{DeliveryError, DeliveryReceipt, EmailTransport, OutgoingEmail};
use crate::config::MailerConfig;

/// Email transport using the Mailgun messages API.
#[derive(Clone)]
pub struct MailgunTransport {
    http: reqwest::Client,
    api_key: String,
    domain: String,
    config: MailerConfig,
}

impl MailgunTransport {
    pub fn new(config: MailerConfig) -> Result<Self, DeliveryError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(DeliveryError::NotConfigured("MAILGUN_API_KEY is not set"))?;
        let domain = config
            .domain
            .clone()
            .ok_or(DeliveryError::NotConfigured("MAILGUN_DOMAIN is not set"))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("channel-digest/0.1")
            .build()?;

        Ok(Self {
            http,
            api_key,
            domain,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.domain
        )
    }

    fn form_fields<'a>(&'a self, email: &'a OutgoingEmail) -> Vec<(&'static str, &'a str)> {
        let mut fields = vec![
            ("from", self.config.from.as_str()),
            ("to", email.to.as_str()),
            ("subject", email.subject.as_str()),
            ("text", email.text.as_str()),
        ];
        if let Some(html) = email.html.as_deref() {
            fields.push(("html", html));
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: String,
}

#[rocket::async_trait]
impl EmailTransport for MailgunTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError> {
        email.validate()?;

        let response = self
            .http
            .post(self.endpoint())
            .basic_auth("api", Some(&self.api_key))
            .form(&self.form_fields(email))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("mailer: delivery to {} failed with {}: {}", email.to, status, body);
            return Err(DeliveryError::Service { status, body });
        }

        let body = response.bytes().await?;
        let parsed: MailgunResponse = serde_json::from_slice(&body)?;
        log::info!("mailer: queued email {} for {}", parsed.id, email.to);

        Ok(DeliveryReceipt { id: parsed.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MailerConfig {
        MailerConfig {
            api_key: Some("key-test".to_string()),
            domain: Some("mg.example.com".to_string()),
            base_url: "https://api.mailgun.net/v3/".to_string(),
            from: "Digest <digest@example.com>".to_string(),
            request_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn endpoint_joins_base_and_domain() {
        let transport = MailgunTransport::new(test_config()).unwrap();
        assert_eq!(
            transport.endpoint(),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );
    }

    #[test]
    fn form_includes_html_only_when_present() {
        let transport = MailgunTransport::new(test_config()).unwrap();
        let mut email = OutgoingEmail {
            to: "reader@example.com".to_string(),
            subject: "Digest".to_string(),
            text: "plain".to_string(),
            html: None,
        };

        let fields = transport.form_fields(&email);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], ("from", "Digest <digest@example.com>"));

        email.html = Some("<p>rich</p>".to_string());
        let fields = transport.form_fields(&email);
        assert_eq!(fields.last(), Some(&("html", "<p>rich</p>")));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let mut config = test_config();
        config.domain = None;
        assert!(matches!(
            MailgunTransport::new(config),
            Err(DeliveryError::NotConfigured(_))
        ));
    }
}
