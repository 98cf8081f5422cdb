//! # Wangshu (form client for the Wangshu Echo forum)
//!
//! `wangshu` drives the forum's AJAX form endpoints from Rust: registration with
//! an emailed verification code, login, post creation with image upload and AI
//! drafting, and comment submission.
//!
//! ## Submission workflow
//!
//! Every mutating request carries an anti-forgery token (`X-CSRFToken`). The
//! token is fetched once and reused; when the server rejects it, the client
//! refreshes it and retries the request exactly once.
//!
//! Registration runs local format checks first, then the remote checks in a
//! fixed order (verification code, username, email) and only submits when all
//! of them passed. The validation state of each field is owned by the workflow
//! instance, and rendering is left to the caller through [`forum::render`].

pub mod cli;
pub mod forum;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
