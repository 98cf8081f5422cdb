use crate::cli::commands::{ARG_BASE_URL, ARG_REMEMBER_FILE, ARG_TIMEOUT};
use crate::forum::{ClientConfig, HttpApi, RememberStore, Timeouts};
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub base_url: Url,
    pub timeout: Option<Duration>,
    pub remember_file: Option<PathBuf>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
            remember_file: None,
        }
    }

    /// # Errors
    /// Returns an error if the base URL is missing or not a valid URL.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .context("missing required argument: --base-url")?;
        let base_url = Url::parse(base_url).context("invalid WANGSHU_BASE_URL")?;

        Ok(Self {
            base_url,
            timeout: matches
                .get_one::<u64>(ARG_TIMEOUT)
                .map(|secs| Duration::from_secs(*secs)),
            remember_file: matches.get_one::<String>(ARG_REMEMBER_FILE).map(PathBuf::from),
        })
    }

    /// Client configuration with the timeout override applied to every call.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let timeouts = self.timeout.map_or_else(Timeouts::default, |timeout| Timeouts {
            token: timeout,
            check: timeout,
            login: timeout,
            submit: timeout,
            draft: timeout,
        });

        ClientConfig::new(self.base_url.clone()).with_timeouts(timeouts)
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn api(&self) -> Result<HttpApi> {
        HttpApi::new(self.client_config()).context("failed to build forum client")
    }

    #[must_use]
    pub fn remember_store(&self) -> Option<RememberStore> {
        self.remember_file
            .clone()
            .or_else(RememberStore::default_path)
            .map(RememberStore::new)
    }
}
