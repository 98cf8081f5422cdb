//! Client side of the Wangshu Echo forum forms: field checks, registration,
//! login, composing, and the token handling they all share.

pub mod api;
pub mod compose;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod login;
pub mod register;
pub mod remember;
pub mod render;
pub mod state;
pub mod submitting;
pub mod token;
pub mod transport;
pub mod validate;
pub mod validator;

pub use self::api::{FormApi, HttpApi};
pub use self::compose::{Composer, PostForm};
pub use self::config::{ClientConfig, Endpoints, Timeouts};
pub use self::cooldown::{CodeDispatcher, Dispatch};
pub use self::error::{Field, FieldError, FormError, TransportError};
pub use self::login::{Login, LoginForm};
pub use self::register::{Registration, RegistrationForm};
pub use self::remember::RememberStore;
pub use self::render::FormErrors;
pub use self::state::{FieldState, ValidationBoard, Validity};
pub use self::submitting::Submitting;
