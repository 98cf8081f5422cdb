//! HTTP dispatch shared by every forum call. The transport attaches the
//! anti-forgery token and a request id, enforces the per-call timeout and owns
//! the single refresh-and-retry cycle for rejected tokens. Status codes are left
//! to the caller through [`Reply`].

use super::{
    config::ClientConfig,
    error::{sanitize, FormError, TransportError},
    token::{SecurityToken, TokenStore},
};
use crate::APP_USER_AGENT;
use reqwest::{
    cookie::Jar,
    multipart::{Form, Part as MultipartPart},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};
use ulid::Ulid;
use url::Url;

#[derive(Debug, Clone)]
pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Request body. Kept as plain data so a retry can rebuild it.
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<Part>),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub payload: Payload,
    pub timeout: Duration,
    /// Also carry the token inside the body, for form handlers that read it there.
    pub token_in_body: bool,
}

impl Call {
    pub fn post(path: impl Into<String>, payload: Payload, timeout: Duration) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            payload,
            timeout,
            token_in_body: false,
        }
    }

    #[must_use]
    pub fn with_token_in_body(mut self) -> Self {
        self.token_in_body = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    /// Final URL after redirects.
    pub url: Url,
    pub body: Option<Value>,
}

impl Reply {
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.as_ref()?.get(key)?.as_str()
    }

    #[must_use]
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.body.as_ref()?.get(key)?.as_bool()
    }

    /// User-safe message from the body, if the server supplied one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.str_field("message")
            .or_else(|| self.str_field("error"))
            .filter(|message| !message.trim().is_empty())
            .map(sanitize)
    }

    /// A 403 whose body blames the anti-forgery token.
    #[must_use]
    pub fn token_rejected(&self) -> bool {
        self.status == StatusCode::FORBIDDEN
            && ["error", "message", "code"].iter().any(|key| {
                self.str_field(key)
                    .is_some_and(|value| value.to_ascii_lowercase().contains("csrf"))
            })
    }

    /// Decodes the JSON body.
    ///
    /// # Errors
    /// Returns `TransportError::Malformed` when the body is missing or does not fit `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FormError> {
        let body = self.body.clone().ok_or_else(|| {
            TransportError::Malformed("expected a JSON response".to_string())
        })?;

        serde_json::from_value(body)
            .map_err(|err| TransportError::Malformed(format!("failed to decode response: {err}")).into())
    }

    /// Maps a non-success status into the error taxonomy.
    #[must_use]
    pub fn status_error(&self) -> FormError {
        let status = self.status.as_u16();
        if self.status == StatusCode::METHOD_NOT_ALLOWED {
            TransportError::MethodNotAllowed.into()
        } else if self.status.is_server_error() {
            FormError::Server { status }
        } else {
            TransportError::Rejected {
                status,
                message: self.message().unwrap_or_else(|| sanitize("")),
            }
            .into()
        }
    }
}

pub struct Transport {
    client: Client,
    config: ClientConfig,
    tokens: TokenStore,
}

impl Transport {
    /// # Errors
    /// Returns an error if the HTTP client or the token endpoint cannot be set up.
    pub fn new(config: ClientConfig) -> Result<Self, FormError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|err| TransportError::Malformed(format!("failed to build client: {err}")))?;
        let tokens = TokenStore::new(client.clone(), jar, &config)?;

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Sends a call with the current token. A token rejection invalidates the
    /// token and retries once with a fresh one; a second rejection is terminal.
    ///
    /// # Errors
    /// Returns a token error when no valid token can be obtained, or a
    /// transport error for timeouts and network failures.
    #[instrument(skip(self, call), fields(path = %call.path))]
    pub async fn send(&self, call: &Call) -> Result<Reply, FormError> {
        let url = self
            .config
            .url(&call.path)
            .map_err(|err| TransportError::Malformed(format!("invalid endpoint: {err}")))?;
        let request_id = Ulid::new();
        let mut refreshed = false;

        loop {
            let token = self.tokens.acquire().await?;
            let reply = self.dispatch(&url, call, &token, request_id).await?;

            if !reply.token_rejected() {
                return Ok(reply);
            }

            if refreshed {
                return Err(FormError::Token(
                    "security token rejected, please reload and try again".to_string(),
                ));
            }

            warn!(%request_id, "security token rejected, refreshing once");
            self.tokens.invalidate().await;
            refreshed = true;
        }
    }

    async fn dispatch(
        &self,
        url: &Url,
        call: &Call,
        token: &SecurityToken,
        request_id: Ulid,
    ) -> Result<Reply, FormError> {
        let builder = self
            .client
            .request(call.method.clone(), url.clone())
            .timeout(call.timeout)
            .header(self.config.token_header.as_str(), token.expose())
            .header("X-Request-Id", request_id.to_string());

        let builder = self.attach_payload(builder, call, token)?;

        debug!(%request_id, method = %call.method, "sending request to {url}");

        let response = builder.send().await.map_err(map_request_error)?;
        let status = response.status();
        let final_url = response.url().clone();
        let text = response.text().await.map_err(map_request_error)?;

        debug!(%request_id, status = status.as_u16(), "response received");

        Ok(Reply {
            status,
            url: final_url,
            body: serde_json::from_str(&text).ok(),
        })
    }

    fn attach_payload(
        &self,
        builder: RequestBuilder,
        call: &Call,
        token: &SecurityToken,
    ) -> Result<RequestBuilder, FormError> {
        let token_field = call
            .token_in_body
            .then(|| (self.config.token_field.clone(), token.expose().to_string()));

        let builder = match &call.payload {
            Payload::Empty => builder,
            Payload::Json(value) => {
                let mut value = value.clone();
                if let (Some((name, token)), Some(object)) = (token_field, value.as_object_mut()) {
                    object.insert(name, Value::String(token));
                }
                builder.json(&value)
            }
            Payload::Form(fields) => {
                let mut fields = fields.clone();
                fields.extend(token_field);
                builder.form(&fields)
            }
            Payload::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = match part {
                        Part::Text { name, value } => form.text(name.clone(), value.clone()),
                        Part::File {
                            name,
                            file_name,
                            mime,
                            bytes,
                        } => {
                            let file = MultipartPart::bytes(bytes.clone())
                                .file_name(file_name.clone())
                                .mime_str(mime)
                                .map_err(|err| {
                                    TransportError::Malformed(format!("invalid upload type: {err}"))
                                })?;
                            form.part(name.clone(), file)
                        }
                    };
                }
                if let Some((name, token)) = token_field {
                    form = form.text(name, token);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

/// Maps reqwest failures into distinct, user-readable transport reasons.
fn map_request_error(err: reqwest::Error) -> FormError {
    if err.is_timeout() {
        TransportError::Timeout.into()
    } else if err.is_decode() || err.is_body() {
        TransportError::Malformed("failed to read response body".to_string()).into()
    } else {
        TransportError::Unreachable.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, body: Option<Value>) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            url: Url::parse("http://localhost/").unwrap(),
            body,
        }
    }

    #[test]
    fn token_rejection_needs_forbidden_and_csrf_error() {
        let rejected = reply(403, Some(json!({"error": "CSRF token missing or incorrect"})));
        assert!(rejected.token_rejected());

        let other_forbidden = reply(403, Some(json!({"error": "not allowed"})));
        assert!(!other_forbidden.token_rejected());

        let bad_request = reply(400, Some(json!({"error": "CSRF token missing"})));
        assert!(!bad_request.token_rejected());
    }

    #[test]
    fn status_error_mapping() {
        assert_eq!(
            reply(405, None).status_error(),
            FormError::Transport(TransportError::MethodNotAllowed)
        );
        assert_eq!(
            reply(502, Some(json!({"message": "Traceback (most recent call last)"}))).status_error(),
            FormError::Server { status: 502 }
        );
        assert_eq!(
            reply(404, Some(json!({"message": "  no such post  "}))).status_error(),
            FormError::Transport(TransportError::Rejected {
                status: 404,
                message: "no such post".to_string()
            })
        );
    }

    #[test]
    fn json_without_body_is_malformed() {
        let err = reply(200, None).json::<Value>().unwrap_err();
        assert!(matches!(
            err,
            FormError::Transport(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn message_prefers_message_over_error() {
        let r = reply(400, Some(json!({"message": "taken", "error": "other"})));
        assert_eq!(r.message(), Some("taken".to_string()));
        let r = reply(400, Some(json!({"error": "empty comment"})));
        assert_eq!(r.message(), Some("empty comment".to_string()));
    }
}
