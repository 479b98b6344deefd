use crate::core::params::ConnectionParameters;
use crate::core::{DynamicConnection, DynconnError, Result};
use crate::session::SwitchTarget;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key in `[connection]` holding a DSN that the other keys refine.
const URL_KEY: &str = "url";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Initial connection parameters.
    pub connection: ConnectionParameters,
    /// Named switch targets (tenants, shards, replicas).
    #[serde(default)]
    pub targets: BTreeMap<String, SwitchTarget>,
}

impl Config {
    /// Parses a TOML document and normalizes the connection parameters.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(content)?;
        config.connection = resolve_connection(config.connection)?;
        Ok(config)
    }

    /// Looks up a named switch target.
    pub fn target(&self, name: &str) -> Result<SwitchTarget> {
        self.targets
            .get(name)
            .cloned()
            .ok_or_else(|| DynconnError::Config(format!("Unknown target '{}'", name)))
    }

    /// Creates the connection handle described by `[connection]`.
    pub fn open_connection(&self) -> Result<DynamicConnection> {
        DynamicConnection::from_params(self.connection.clone())
    }
}

fn resolve_connection(mut params: ConnectionParameters) -> Result<ConnectionParameters> {
    let params = match params.remove(URL_KEY) {
        Some(url) => {
            let url = url.as_str().ok_or_else(|| {
                DynconnError::Config("'url' must be a string".to_string())
            })?;
            ConnectionParameters::from_url(url)?.merged_with(&params.normalized())
        }
        None => params.normalized(),
    };
    Ok(params)
}

/// Default configuration location, e.g. `~/.config/dynconn/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dynconn").join("config.toml"))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = dynconn::config::load_config("dynconn.toml")?;
/// println!("{:?}", config.connection);
/// # Ok::<(), dynconn::core::DynconnError>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content)
}
