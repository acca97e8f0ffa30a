//! Pushover message API client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{NotifyError, Priority, PushApi, PushMessage};
use crate::config::PushoverCredentials;

/// Upper bound on a single push request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Emergency pushes repeat every `retry` seconds until acknowledged or
/// `expire` seconds pass; Pushover rejects emergency pushes without both.
const EMERGENCY_RETRY_SECS: u32 = 60;
const EMERGENCY_EXPIRE_SECS: u32 = 3600;

/// Posts form-encoded messages to the Pushover API.
pub struct PushoverClient {
    client: Client,
    credentials: PushoverCredentials,
}

impl PushoverClient {
    pub fn new(credentials: PushoverCredentials) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("diskwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn form(&self, message: &PushMessage) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("token", self.credentials.token.clone()),
            ("user", self.credentials.user.clone()),
            ("title", message.title.clone()),
            ("message", message.message.clone()),
            ("priority", message.priority.code().to_string()),
        ];
        if message.priority == Priority::Emergency {
            form.push(("retry", EMERGENCY_RETRY_SECS.to_string()));
            form.push(("expire", EMERGENCY_EXPIRE_SECS.to_string()));
        }
        form
    }
}

#[async_trait::async_trait]
impl PushApi for PushoverClient {
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.credentials.endpoint)
            .form(&self.form(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "pushover accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            detail: rejection_detail(&body),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PushoverReply {
    #[serde(default)]
    errors: Vec<String>,
}

/// Pushover lists problems in an `errors` array; anything else is shown raw.
fn rejection_detail(body: &str) -> String {
    match serde_json::from_str::<PushoverReply>(body) {
        Ok(reply) if !reply.errors.is_empty() => reply.errors.join("; "),
        _ if body.trim().is_empty() => "no details".to_string(),
        _ => body.trim().chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::http::{header, StatusCode};
    use axum::routing::post;
    use axum::{Form, Router};
    use tokio::net::TcpListener;

    type Received = Arc<Mutex<Vec<HashMap<String, String>>>>;

    fn credentials(endpoint: String) -> PushoverCredentials {
        PushoverCredentials {
            token: "app-token".to_string(),
            user: "user-key".to_string(),
            endpoint,
        }
    }

    fn message(priority: Priority) -> PushMessage {
        PushMessage {
            title: "Low Disk Space Alert: /".to_string(),
            message: "Free: 5.00%".to_string(),
            priority,
        }
    }

    /// Serve the messages route locally, answering every post with `status`
    /// and `body`. Returns the endpoint URL and the form fields received.
    async fn scripted_endpoint(status: StatusCode, body: &'static str) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let captured = received.clone();
        let app = Router::new().route(
            "/1/messages.json",
            post(move |Form(fields): Form<HashMap<String, String>>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(fields);
                    (status, [(header::CONTENT_TYPE, "application/json")], body)
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/1/messages.json", addr), received)
    }

    #[test]
    fn test_form_fields() {
        let client = PushoverClient::new(credentials("http://localhost".to_string())).unwrap();
        let form = client.form(&message(Priority::High));
        assert_eq!(
            form,
            vec![
                ("token", "app-token".to_string()),
                ("user", "user-key".to_string()),
                ("title", "Low Disk Space Alert: /".to_string()),
                ("message", "Free: 5.00%".to_string()),
                ("priority", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_emergency_adds_retry_and_expire() {
        let client = PushoverClient::new(credentials("http://localhost".to_string())).unwrap();
        let form = client.form(&message(Priority::Emergency));
        assert!(form.contains(&("priority", "2".to_string())));
        assert!(form.contains(&("retry", "60".to_string())));
        assert!(form.contains(&("expire", "3600".to_string())));
    }

    #[test]
    fn test_rejection_detail() {
        assert_eq!(
            rejection_detail(
                r#"{"user":"invalid","errors":["user identifier is invalid"],"status":0}"#
            ),
            "user identifier is invalid"
        );
        assert_eq!(rejection_detail("  "), "no details");
        assert_eq!(rejection_detail("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_push_posts_form() {
        let (endpoint, received) =
            scripted_endpoint(StatusCode::OK, r#"{"status":1,"request":"abc"}"#).await;
        let client = PushoverClient::new(credentials(endpoint)).unwrap();

        client.push(&message(Priority::High)).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let fields = &received[0];
        assert_eq!(fields["token"], "app-token");
        assert_eq!(fields["user"], "user-key");
        assert_eq!(fields["title"], "Low Disk Space Alert: /");
        assert_eq!(fields["message"], "Free: 5.00%");
        assert_eq!(fields["priority"], "1");
        assert!(!fields.contains_key("retry"));
    }

    #[tokio::test]
    async fn test_push_rejected_status() {
        let (endpoint, received) = scripted_endpoint(
            StatusCode::BAD_REQUEST,
            r#"{"token":"invalid","errors":["application token is invalid"],"status":0}"#,
        )
        .await;
        let client = PushoverClient::new(credentials(endpoint)).unwrap();

        let err = client.push(&message(Priority::Normal)).await.unwrap_err();
        assert_eq!(received.lock().unwrap().len(), 1);
        match err {
            NotifyError::Rejected { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "application token is invalid");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_push_unreachable_endpoint() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PushoverClient::new(credentials(format!("http://{}/", addr))).unwrap();
        let err = client.push(&message(Priority::High)).await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
