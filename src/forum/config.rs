//! Client configuration: the forum base URL, endpoint paths, per-endpoint
//! timeouts and the names under which the anti-forgery token travels. Defaults
//! match the forum's stock routes, so most callers only set the base URL.

use std::time::Duration;
use url::Url;

/// Header carrying the anti-forgery token on mutating requests.
pub const DEFAULT_TOKEN_HEADER: &str = "X-CSRFToken";
/// Form field carrying the anti-forgery token for form-encoded submissions.
pub const DEFAULT_TOKEN_FIELD: &str = "csrf_token";
/// Cookie names searched for an already issued token, in order.
pub const DEFAULT_TOKEN_COOKIES: [&str; 2] = ["csrftoken", "csrf_token"];

#[derive(Clone, Debug)]
pub struct Endpoints {
    pub token: String,
    pub send_code: String,
    pub verify_code: String,
    pub check_username: String,
    pub check_email: String,
    pub login: String,
    pub register: String,
    pub create_post: String,
    pub draft: String,
    pub comment: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: "/user/api/csrf-token".to_string(),
            send_code: "/user/api/send-verification-code".to_string(),
            verify_code: "/user/api/verify-code".to_string(),
            check_username: "/user/api/check_username".to_string(),
            check_email: "/user/api/check_email".to_string(),
            login: "/user/login".to_string(),
            register: "/user/register".to_string(),
            create_post: "/QA/post".to_string(),
            draft: "/QA/api/ai-write".to_string(),
            comment: "/QA/api/add_comment".to_string(),
        }
    }
}

/// Per-endpoint request timeouts. Login is interactive and kept short, AI
/// drafting waits on a model and gets the longest budget.
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    pub token: Duration,
    pub check: Duration,
    pub login: Duration,
    pub submit: Duration,
    pub draft: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            token: Duration::from_secs(10),
            check: Duration::from_secs(30),
            login: Duration::from_secs(5),
            submit: Duration::from_secs(30),
            draft: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
    pub token_header: String,
    pub token_field: String,
    pub token_cookies: Vec<String>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            token_cookies: DEFAULT_TOKEN_COOKIES.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Join an endpoint path onto the base URL.
    ///
    /// # Errors
    /// Returns an error if the joined URL cannot be parsed.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim();

        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
    }
}
