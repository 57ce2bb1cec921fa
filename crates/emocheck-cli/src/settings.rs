//! Configuration discovery and command-line overrides

use crate::cli::Cli;
use anyhow::{Context, Result};
use emocheck_classifiers::{EmocheckConfig, TokenizerSource};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "emocheck.yaml";

/// Pick the configuration file to read, if any.
///
/// An explicit path (flag or `EMOCHECK_CONFIG`) wins, then `./emocheck.yaml`,
/// then `<config_dir>/emocheck/config.yaml`.
pub fn discover_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("emocheck").join("config.yaml"))
        .filter(|path| path.is_file())
}

/// Build the effective configuration: file (or defaults), then CLI flags
pub fn load(cli: &Cli) -> Result<EmocheckConfig> {
    let mut config = match discover_config(cli.config.as_deref()) {
        Some(path) => {
            debug!("Reading configuration from {}", path.display());
            EmocheckConfig::from_file(&path)
                .with_context(|| format!("loading configuration {}", path.display()))?
        }
        None => {
            debug!("No configuration file found; using defaults");
            EmocheckConfig::default()
        }
    };

    apply_overrides(&mut config, cli);
    Ok(config)
}

/// Flags given on the command line replace file values
pub fn apply_overrides(config: &mut EmocheckConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model.path = model.clone();
        // a new path may carry a different extension
        config.model.format = None;
    }

    if let Some(tokenizer) = &cli.tokenizer {
        config.tokenizer.source = TokenizerSource::parse(tokenizer);
    }

    if let Some(device) = cli.device {
        config.inference.device = device;
    }

    if let Some(pooling) = cli.pooling {
        config.inference.pooling = pooling;
    }
}
