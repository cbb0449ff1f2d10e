use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use promochat_chat::{Backends, Orchestrator, OrchestratorConfig};
use promochat_llm_api::{BackendType, ClientFactory, LocalConfig, RelayConfig};
use promochat_storage::{FileStore, KeyValueStore, MemoryStore};
use promochat_types::BackendMode;

use crate::cli::Cli;

/// Everything the front-ends need, built from CLI arguments and environment
pub struct AppConfig {
    pub orchestrator: Orchestrator,
    /// Where history lives; `None` when running ephemeral
    pub data_dir: Option<PathBuf>,
}

/// Set up storage, both backends and the orchestrator from CLI arguments
pub fn setup_from_cli(cli: &Cli) -> Result<AppConfig> {
    let (store, data_dir) = build_store(cli)?;

    let request_log_dir = if cli.log_requests {
        Some(promochat_logging::get_logs_dir()?)
    } else {
        None
    };

    let mut relay = RelayConfig {
        api_key: cli.relay_key.clone(),
        verbose: cli.log_requests,
        request_log_dir: request_log_dir.clone(),
        ..RelayConfig::default()
    };
    if let Some(url) = &cli.relay_url {
        relay.base_url = url.clone();
    }
    if let Some(model) = &cli.relay_model {
        relay.model = model.clone();
    }

    let mut local = LocalConfig {
        verbose: cli.log_requests,
        request_log_dir,
        ..LocalConfig::default()
    };
    if let Some(url) = &cli.local_url {
        local.base_url = url.clone();
    }
    if let Some(model) = &cli.local_model {
        local.model = model.clone();
    }

    log::debug!("Relay: {} ({})", relay.base_url, relay.model);
    log::debug!("Local model server: {} ({})", local.base_url, local.model);

    let (remote, local) = ClientFactory::create_pair(relay, local);
    let config = OrchestratorConfig {
        greeting_delay: Duration::from_millis(cli.greeting_delay_ms),
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::new(config, store, Backends::new(remote, local));

    if let Some(mode) = cli.mode.as_deref() {
        orchestrator.set_backend_mode(parse_mode(mode)?);
    }

    Ok(AppConfig {
        orchestrator,
        data_dir,
    })
}

fn build_store(cli: &Cli) -> Result<(Arc<dyn KeyValueStore>, Option<PathBuf>)> {
    if cli.ephemeral {
        return Ok((Arc::new(MemoryStore::new()), None));
    }

    let dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => promochat_logging::get_promochat_dir()?.join("store"),
    };
    let store = FileStore::new(&dir)
        .with_context(|| format!("Failed to open data directory {}", dir.display()))?;
    let dir = store.dir().to_path_buf();

    Ok((Arc::new(store), Some(dir)))
}

/// Accepts `remote`/`local` and the backend names (`relay`, `ollama`, ...)
pub fn parse_mode(value: &str) -> Result<BackendMode> {
    let value = value.trim().to_lowercase();
    BackendMode::from_str(&value)
        .or_else(|| BackendType::from_str(&value).map(|backend| backend.mode()))
        .with_context(|| format!("Unknown backend mode '{}' (expected remote or local)", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("remote").unwrap(), BackendMode::Remote);
        assert_eq!(parse_mode(" LOCAL ").unwrap(), BackendMode::Local);
        assert_eq!(parse_mode("relay").unwrap(), BackendMode::Remote);
        assert_eq!(parse_mode("ollama").unwrap(), BackendMode::Local);
        assert!(parse_mode("cloud").is_err());
    }
}
