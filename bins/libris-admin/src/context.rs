//! Shared state for one CLI invocation

use anyhow::{anyhow, bail, Context as _, Result};
use libris_api_client::{ApiResult, ClientConfig, LibraryClient, QueryClient, QueryState};
use libris_cli::{progress, OutputFormat};
use libris_core::cache::QueryConfig;
use libris_telemetry::Timer;
use serde::Serialize;
use std::future::Future;

/// Query client plus output settings
pub struct Context {
    queries: QueryClient,
    format: OutputFormat,
}

impl Context {
    /// Build the clients from the environment, with an optional URL override
    pub fn new(api_url: Option<&str>, format: OutputFormat, no_retry: bool) -> Result<Self> {
        let mut config = ClientConfig::from_env().context("Invalid API configuration")?;
        if let Some(url) = api_url {
            config = config.with_base_url(url);
        }
        let api = LibraryClient::with_config(config).context("Failed to create API client")?;

        let query_config = if no_retry {
            QueryConfig::no_retry()
        } else {
            QueryConfig::default()
        };

        Ok(Self {
            queries: QueryClient::new(api, query_config),
            format,
        })
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    /// Await a cached read behind a spinner
    ///
    /// A disabled read becomes an error naming `what`.
    pub async fn load<T, Fut>(&self, what: &str, read: Fut) -> Result<T>
    where
        Fut: Future<Output = QueryState<T>>,
    {
        let spinner = progress::spinner(&format!("Loading {what}..."));
        let timer = Timer::start(format!("load {what}"));
        let state = read.await;
        timer.stop();
        progress::clear(&spinner);

        match state {
            QueryState::Ready(data) => Ok(data),
            QueryState::Failed(e) => Err(anyhow!("Failed to load {what}: {e}")),
            QueryState::NotRequested => bail!("Cannot load {what}: a required argument is missing or empty"),
            QueryState::Loading => bail!("Still loading {what}"),
        }
    }

    /// Await a write behind a spinner
    pub async fn write<T, Fut>(&self, what: &str, write: Fut) -> Result<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        let spinner = progress::spinner(&format!("{what}..."));
        let timer = Timer::start(what);
        let result = write.await;
        timer.stop();

        match result {
            Ok(value) => {
                progress::clear(&spinner);
                Ok(value)
            }
            Err(e) => {
                progress::finish_error(&spinner, what);
                Err(e).with_context(|| format!("Failed to {}", what.to_lowercase()))
            }
        }
    }

    /// Print `value` as JSON, or call `text` for human output
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T),
    {
        if self.format.is_json() {
            libris_cli::output::print_json(value)?;
        } else {
            text(value);
        }
        Ok(())
    }
}
