//! The forum's remote surface. [`FormApi`] is the seam the workflows are written
//! against; [`HttpApi`] implements it over [`Transport`] and is the only place
//! that interprets endpoint-specific status codes and bodies.

use super::{
    config::ClientConfig,
    error::{sanitize, Field, FormError, TransportError},
    transport::{Call, Part, Payload, Reply, Transport},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shown for every credential failure so the reply never reveals which field was wrong.
pub const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Outcome of a remote uniqueness or correctness check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: SecretString,
    pub remember: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub redirect: String,
    pub remember: bool,
    pub identifier: String,
}

#[derive(Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct CommentRequest {
    pub post_id: u64,
    pub content: String,
}

/// Where the caller should navigate after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentAuthor {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub content: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub author: Option<CommentAuthor>,
}

#[async_trait]
pub trait FormApi: Send + Sync {
    async fn send_code(&self, email: &str) -> Result<String, FormError>;
    async fn verify_code(&self, email: &str, code: &str) -> Result<Verdict, FormError>;
    async fn check_username(&self, username: &str) -> Result<Verdict, FormError>;
    async fn check_email(&self, email: &str) -> Result<Verdict, FormError>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginSuccess, FormError>;
    async fn register(&self, request: &RegisterRequest) -> Result<Redirect, FormError>;
    async fn create_post(&self, request: &PostRequest) -> Result<Redirect, FormError>;
    async fn draft(&self, title: &str) -> Result<String, FormError>;
    async fn comment(&self, request: &CommentRequest) -> Result<Comment, FormError>;
}

#[derive(Clone)]
pub struct HttpApi {
    transport: Arc<Transport>,
}

impl HttpApi {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, FormError> {
        Ok(Self {
            transport: Arc::new(Transport::new(config)?),
        })
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Obtains the token up front so the first submission does not pay for it.
    ///
    /// # Errors
    /// Returns `FormError::Token` if no token can be obtained.
    pub async fn prefetch_token(&self) -> Result<(), FormError> {
        self.transport.tokens().acquire().await.map(|_| ())
    }

    fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    async fn check(&self, path: &str, body: Value) -> Result<Verdict, FormError> {
        let call = Call::post(path, Payload::Json(body), self.config().timeouts.check);
        let reply = self.transport.send(&call).await?;

        // check endpoints answer a rejected value with 4xx and a verdict body
        let verdict_status = reply.status.is_success()
            || (reply.status.is_client_error() && reply.status != StatusCode::METHOD_NOT_ALLOWED);

        match reply.json::<Verdict>() {
            Ok(verdict) if verdict_status => Ok(Verdict {
                valid: verdict.valid,
                message: verdict.message.as_deref().map(sanitize),
            }),
            Err(err) if reply.status.is_success() => Err(err),
            _ => Err(reply.status_error()),
        }
    }
}

#[derive(Deserialize)]
struct SendCodeReply {
    #[serde(default)]
    success: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    redirect_url: Option<Value>,
    #[serde(default)]
    remember: Option<bool>,
    #[serde(default)]
    identifier: Option<String>,
}

#[derive(Deserialize)]
struct RegisterReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Deserialize)]
struct DraftReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct CommentReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    comment: Option<Comment>,
}

/// Joins form validation errors (`{"errors": {"title": ["..."]}}`) into one line.
fn form_errors(reply: &Reply) -> Option<String> {
    let errors = reply.body.as_ref()?.get("errors")?.as_object()?;
    let messages: Vec<String> = errors
        .values()
        .flat_map(|value| match value {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Value::String(message) => vec![message.clone()],
            _ => Vec::new(),
        })
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(sanitize(&messages.join("; ")))
    }
}

fn rejected(reply: &Reply, fallback: &str) -> FormError {
    TransportError::Rejected {
        status: reply.status.as_u16(),
        message: form_errors(reply)
            .or_else(|| reply.message())
            .unwrap_or_else(|| fallback.to_string()),
    }
    .into()
}

#[async_trait]
impl FormApi for HttpApi {
    #[instrument(skip(self, email))]
    async fn send_code(&self, email: &str) -> Result<String, FormError> {
        let call = Call::post(
            &self.config().endpoints.send_code,
            Payload::Json(json!({ "email": email })),
            self.config().timeouts.submit,
        );
        let reply = self.transport.send(&call).await?;

        if reply.status.is_success() {
            let body: SendCodeReply = reply.json()?;
            if body.success {
                return Ok(reply
                    .message()
                    .unwrap_or_else(|| "verification code sent, please check your inbox".to_string()));
            }
        } else if !reply.status.is_client_error() || reply.status == StatusCode::METHOD_NOT_ALLOWED {
            return Err(reply.status_error());
        }

        Err(FormError::validation(
            Field::Email,
            reply
                .message()
                .unwrap_or_else(|| "failed to send verification code".to_string()),
        ))
    }

    #[instrument(skip(self, email, code))]
    async fn verify_code(&self, email: &str, code: &str) -> Result<Verdict, FormError> {
        let path = self.config().endpoints.verify_code.clone();
        self.check(&path, json!({ "email": email, "code": code }))
            .await
    }

    #[instrument(skip(self))]
    async fn check_username(&self, username: &str) -> Result<Verdict, FormError> {
        let path = self.config().endpoints.check_username.clone();
        self.check(&path, json!({ "username": username })).await
    }

    #[instrument(skip(self, email))]
    async fn check_email(&self, email: &str) -> Result<Verdict, FormError> {
        let path = self.config().endpoints.check_email.clone();
        self.check(&path, json!({ "email": email })).await
    }

    #[instrument(skip(self, request), fields(identifier = %request.identifier))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginSuccess, FormError> {
        let call = Call::post(
            &self.config().endpoints.login,
            Payload::Form(vec![
                ("identifier".to_string(), request.identifier.clone()),
                (
                    "password".to_string(),
                    request.password.expose_secret().to_string(),
                ),
                ("remember".to_string(), request.remember.to_string()),
            ]),
            self.config().timeouts.login,
        )
        .with_token_in_body();
        let reply = self.transport.send(&call).await?;

        match reply.status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(FormError::validation(Field::Identifier, INVALID_CREDENTIALS));
            }
            status if !status.is_success() => return Err(reply.status_error()),
            _ => {}
        }

        let body: LoginReply = reply.json()?;
        if !body.success {
            debug!("login refused by server");
            return Err(FormError::validation(Field::Identifier, INVALID_CREDENTIALS));
        }

        let redirect = body
            .redirect_url
            .as_ref()
            .and_then(Value::as_str)
            .filter(|target| !target.trim().is_empty())
            .ok_or_else(|| TransportError::Malformed("invalid redirect target".to_string()))?;

        Ok(LoginSuccess {
            redirect: redirect.to_string(),
            remember: body.remember.unwrap_or(request.remember),
            identifier: body
                .identifier
                .unwrap_or_else(|| request.identifier.clone()),
        })
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn register(&self, request: &RegisterRequest) -> Result<Redirect, FormError> {
        let call = Call::post(
            &self.config().endpoints.register,
            Payload::Form(vec![
                ("username".to_string(), request.username.clone()),
                ("email".to_string(), request.email.clone()),
                (
                    "password".to_string(),
                    request.password.expose_secret().to_string(),
                ),
                (
                    "confirm_password".to_string(),
                    request.confirm_password.expose_secret().to_string(),
                ),
                ("code".to_string(), request.code.clone()),
            ]),
            self.config().timeouts.submit,
        );
        let reply = self.transport.send(&call).await?;

        if !reply.status.is_success() {
            return Err(if reply.status.is_client_error()
                && reply.status != StatusCode::METHOD_NOT_ALLOWED
            {
                rejected(&reply, "registration failed")
            } else {
                reply.status_error()
            });
        }

        let body: RegisterReply = reply.json()?;
        if body.status != "success" {
            return Err(rejected(&reply, "registration failed"));
        }

        Ok(Redirect {
            target: body
                .redirect_url
                .filter(|target| !target.trim().is_empty())
                .unwrap_or_else(|| "/".to_string()),
            message: reply.message(),
        })
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    async fn create_post(&self, request: &PostRequest) -> Result<Redirect, FormError> {
        let mut parts = vec![
            Part::Text {
                name: "title".to_string(),
                value: request.title.clone(),
            },
            Part::Text {
                name: "content".to_string(),
                value: request.content.clone(),
            },
        ];
        if let Some(image) = &request.image {
            parts.push(Part::File {
                name: "image".to_string(),
                file_name: image.file_name.clone(),
                mime: image.mime.clone(),
                bytes: image.bytes.clone(),
            });
        }

        let path = self.config().endpoints.create_post.clone();
        let call = Call::post(
            &path,
            Payload::Multipart(parts),
            self.config().timeouts.submit,
        )
        .with_token_in_body();
        let reply = self.transport.send(&call).await?;

        if !reply.status.is_success() {
            return Err(if reply.status.is_client_error()
                && reply.status != StatusCode::METHOD_NOT_ALLOWED
            {
                rejected(&reply, "failed to publish the post")
            } else {
                reply.status_error()
            });
        }

        if reply.str_field("status") == Some("error") {
            return Err(rejected(&reply, "failed to publish the post"));
        }

        // a plain form submission is answered with a redirect to the new page
        let target = if reply.body.is_none() && reply.url.path() != path {
            let mut target = reply.url.path().to_string();
            if let Some(query) = reply.url.query() {
                target.push('?');
                target.push_str(query);
            }
            target
        } else {
            "/".to_string()
        };

        Ok(Redirect {
            target,
            message: reply.message(),
        })
    }

    #[instrument(skip(self))]
    async fn draft(&self, title: &str) -> Result<String, FormError> {
        let call = Call::post(
            &self.config().endpoints.draft,
            Payload::Json(json!({ "title": title })),
            self.config().timeouts.draft,
        );
        let reply = self.transport.send(&call).await?;

        if !reply.status.is_success() {
            return Err(reply.status_error());
        }

        let body: DraftReply = reply.json()?;
        body.content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                FormError::validation(
                    Field::Title,
                    "no content generated, try a different title",
                )
            })
    }

    #[instrument(skip(self, request), fields(post_id = request.post_id))]
    async fn comment(&self, request: &CommentRequest) -> Result<Comment, FormError> {
        let call = Call::post(
            &self.config().endpoints.comment,
            Payload::Json(json!({
                "content": request.content,
                "post_id": request.post_id,
            })),
            self.config().timeouts.submit,
        );
        let reply = self.transport.send(&call).await?;

        if !reply.status.is_success() {
            return Err(reply.status_error());
        }

        let body: CommentReply = reply.json()?;
        match body.comment {
            Some(comment) if body.success => Ok(comment),
            _ => Err(rejected(&reply, "failed to submit the comment")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    fn reply(status: u16, body: Value) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            url: Url::parse("http://localhost/QA/post").unwrap(),
            body: Some(body),
        }
    }

    #[test]
    fn form_errors_are_joined() {
        let r = reply(
            400,
            json!({"status": "error", "errors": {"title": ["title format error"], "content": "required"}}),
        );
        let joined = form_errors(&r).unwrap();
        assert!(joined.contains("title format error"));
        assert!(joined.contains("required"));
    }

    #[test]
    fn rejected_falls_back_to_server_message_then_default() {
        let r = reply(400, json!({"error": "post does not exist"}));
        assert_eq!(
            rejected(&r, "fallback"),
            FormError::Transport(TransportError::Rejected {
                status: 400,
                message: "post does not exist".to_string()
            })
        );

        let r = reply(400, json!({}));
        assert_eq!(
            rejected(&r, "fallback"),
            FormError::Transport(TransportError::Rejected {
                status: 400,
                message: "fallback".to_string()
            })
        );
    }

    #[test]
    fn verdict_message_is_optional() {
        let verdict: Verdict = serde_json::from_value(json!({"valid": true})).unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.message, None);
    }
}
