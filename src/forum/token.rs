//! Anti-forgery token acquisition. The token is looked up in the cookie jar
//! first and fetched from the token endpoint otherwise; once held, it is reused
//! without further requests until the transport invalidates it.

use super::{config::ClientConfig, error::FormError};
use reqwest::{
    cookie::{CookieStore, Jar},
    Client,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

/// Body field used by the token endpoint.
const TOKEN_BODY_FIELD: &str = "csrf_token";

pub struct SecurityToken(SecretString);

impl SecurityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecurityToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecurityToken([REDACTED])")
    }
}

#[derive(Default)]
struct Held {
    token: Option<SecurityToken>,
    // set after a rejection: the jar may still hold the stale cookie
    skip_cookies: bool,
}

pub struct TokenStore {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    endpoint: Url,
    cookie_names: Vec<String>,
    timeout: Duration,
    held: Mutex<Held>,
}

impl TokenStore {
    /// # Errors
    /// Returns an error if the token endpoint URL cannot be built.
    pub fn new(client: Client, jar: Arc<Jar>, config: &ClientConfig) -> Result<Self, FormError> {
        let endpoint = config
            .url(&config.endpoints.token)
            .map_err(|err| FormError::Token(format!("invalid token endpoint: {err}")))?;

        Ok(Self {
            client,
            jar,
            base_url: config.base_url.clone(),
            endpoint,
            cookie_names: config.token_cookies.clone(),
            timeout: config.timeouts.token,
            held: Mutex::new(Held::default()),
        })
    }

    /// Returns the held token, or obtains one from the cookie jar or the token
    /// endpoint. Concurrent callers wait for a single acquisition.
    ///
    /// # Errors
    /// Returns `FormError::Token` if no token can be obtained in time.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<SecurityToken, FormError> {
        let mut held = self.held.lock().await;

        if let Some(token) = held.token.as_ref() {
            return Ok(token.clone());
        }

        let cached = if held.skip_cookies {
            None
        } else {
            self.from_cookies()
        };

        let token = match cached {
            Some(token) => {
                debug!("using token from cookie");
                token
            }
            None => self.fetch().await?,
        };

        held.token = Some(token.clone());
        held.skip_cookies = false;

        Ok(token)
    }

    /// Drops the held token; the next `acquire` asks the token endpoint.
    pub async fn invalidate(&self) {
        let mut held = self.held.lock().await;
        held.token = None;
        held.skip_cookies = true;
    }

    pub async fn is_held(&self) -> bool {
        self.held.lock().await.token.is_some()
    }

    fn from_cookies(&self) -> Option<SecurityToken> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;

        self.cookie_names
            .iter()
            .find_map(|name| cookie_value(header, name))
            .map(SecurityToken::new)
    }

    async fn fetch(&self) -> Result<SecurityToken, FormError> {
        debug!("requesting token from {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FormError::Token("token request timed out".to_string())
                } else {
                    FormError::Token("unable to reach the token endpoint".to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FormError::Token(format!(
                "token endpoint answered {}, please reload and try again",
                status.as_u16()
            )));
        }

        let body: Option<Value> = response.json().await.ok();
        let from_body = body
            .as_ref()
            .and_then(|body| body.get(TOKEN_BODY_FIELD))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(SecurityToken::new);

        from_body
            .or_else(|| self.from_cookies())
            .ok_or_else(|| FormError::Token("server did not return a valid token".to_string()))
    }
}

/// Finds `name` in a `Cookie` header value (`a=1; b=2`).
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let header = "session=abc; csrf_token=tok123; theme=dark";
        assert_eq!(cookie_value(header, "csrf_token"), Some("tok123".to_string()));
        assert_eq!(cookie_value(header, "csrftoken"), None);
    }

    #[test]
    fn cookie_value_ignores_empty_values() {
        assert_eq!(cookie_value("csrftoken=; csrf_token=x", "csrftoken"), None);
        assert_eq!(cookie_value("csrftoken=; csrf_token=x", "csrf_token"), Some("x".to_string()));
    }

    #[test]
    fn security_token_debug_is_redacted() {
        let token = SecurityToken::new("very-secret");
        assert_eq!(format!("{token:?}"), "SecurityToken([REDACTED])");
        assert_eq!(token.clone().expose(), "very-secret");
    }
}
