//! # TR-064 client configuration
//!
//! This crate tells the discovery code where the router lives and how to
//! talk to it:
//! - Loading configuration from an optional `config.yaml`
//! - Merging with the embedded default configuration
//! - Environment variable overrides
//! - Typed getters with defaults
//!
//! The configuration is read-only on disk: values changed through
//! [`Config::set_value`] only live in memory.
//!
//! ## Usage
//!
//! ```no_run
//! use tr64config::get_config;
//!
//! let config = get_config();
//! let address = config.get_device_address();
//! let port = config.get_device_port();
//! println!("router at {}:{}", address, port);
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = include_str!("tr64.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load TR-064 configuration"));
}

const ENV_CONFIG_DIR: &str = "TR64_CONFIG";
const ENV_PREFIX: &str = "TR64_CONFIG__";
const CONFIG_DIR_NAME: &str = ".tr64";
const CONFIG_FILE_NAME: &str = "config.yaml";

pub const DEFAULT_DEVICE_ADDRESS: &str = "192.168.178.1";
pub const DEFAULT_DEVICE_PORT: u16 = 49000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DESCRIPTIONS: [&str; 2] = ["igddesc.xml", "tr64desc.xml"];

/// Configuration of the TR-064 client.
///
/// Holds the merged YAML tree (embedded defaults, then the external file,
/// then `TR64_CONFIG__*` environment variables). All keys are lower-cased.
#[derive(Debug)]
pub struct Config {
    path: Option<PathBuf>,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    ///
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `TR64_CONFIG` environment variable
    /// 3. `.tr64` in the current directory
    /// 4. `.tr64` in the user's home directory
    ///
    /// Returns `None` when none of them exists.
    fn find_config_dir(directory: &str) -> Option<PathBuf> {
        if !directory.is_empty() {
            return Some(PathBuf::from(directory));
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return Some(PathBuf::from(env_path));
        }

        if Path::new(CONFIG_DIR_NAME).is_dir() {
            return Some(PathBuf::from(CONFIG_DIR_NAME));
        }

        home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .filter(|dir| dir.is_dir())
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external `config.yaml` file if present
    /// 4. Applies environment variable overrides
    ///
    /// Nothing is written back to disk.
    pub fn load_config(directory: &str) -> Result<Self> {
        let path = Self::find_config_dir(directory).map(|dir| dir.join(CONFIG_FILE_NAME));

        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match path.as_ref().map(|p| (p, fs::read(p))) {
            Some((p, Ok(data))) => {
                info!(config_file = %p.display(), "Loaded config file");
                let external: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut value, &Self::lower_keys_value(external));
            }
            Some((p, Err(_))) => {
                info!(config_file = %p.display(), "Config file not found, using default embedded config");
            }
            None => {
                info!("No config directory found, using default embedded config");
            }
        }

        let mut value = Self::lower_keys_value(value);
        Self::apply_env_overrides(&mut value, env::vars());

        Ok(Config {
            path,
            data: Mutex::new(value),
        })
    }

    /// Builds a configuration from a YAML document merged over the defaults.
    ///
    /// Environment overrides are not applied.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let external: Value = serde_yaml::from_str(yaml)?;
        merge_yaml(&mut value, &Self::lower_keys_value(external));

        Ok(Config {
            path: None,
            data: Mutex::new(Self::lower_keys_value(value)),
        })
    }

    /// Path of the external file this configuration was looked up in, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sets a configuration value at the specified path (in memory only)
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["device", "port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(env_var = %key, error = %err, "Ignoring environment override");
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Host name or IP address of the router.
    pub fn get_device_address(&self) -> String {
        match self.get_value(&["device", "address"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Ok(_) => {
                warn!(
                    "Device address is not a string or empty, using default {}",
                    DEFAULT_DEVICE_ADDRESS
                );
                DEFAULT_DEVICE_ADDRESS.to_string()
            }
            Err(err) => {
                warn!(
                    "Failed to get device address: {}, using default {}",
                    err, DEFAULT_DEVICE_ADDRESS
                );
                DEFAULT_DEVICE_ADDRESS.to_string()
            }
        }
    }

    pub fn set_device_address(&self, address: &str) -> Result<()> {
        self.set_value(&["device", "address"], Value::String(address.to_string()))
    }

    /// TR-064 port of the router (49000 on most boxes).
    pub fn get_device_port(&self) -> u16 {
        match self.get_value(&["device", "port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    warn!("Invalid device port {}, using default {}", n, DEFAULT_DEVICE_PORT);
                    DEFAULT_DEVICE_PORT
                }
            },
            Ok(Value::String(s)) => s.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!("Invalid device port '{}', using default {}", s, DEFAULT_DEVICE_PORT);
                DEFAULT_DEVICE_PORT
            }),
            Ok(_) => {
                warn!(
                    "Device port not a number or string, using default {}",
                    DEFAULT_DEVICE_PORT
                );
                DEFAULT_DEVICE_PORT
            }
            Err(err) => {
                warn!(
                    "Failed to get device port: {}, using default {}",
                    err, DEFAULT_DEVICE_PORT
                );
                DEFAULT_DEVICE_PORT
            }
        }
    }

    pub fn set_device_port(&self, port: u16) -> Result<()> {
        self.set_value(&["device", "port"], Value::Number(Number::from(port)))
    }

    /// Global timeout applied to every HTTP request.
    pub fn get_http_timeout(&self) -> Duration {
        let secs = match self.get_value(&["http", "timeout_secs"]) {
            Ok(Value::Number(n)) if n.as_u64().is_some_and(|s| s > 0) => {
                n.as_u64().unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            }
            Ok(other) => {
                warn!(
                    "Invalid HTTP timeout {:?}, using default {}s",
                    other, DEFAULT_HTTP_TIMEOUT_SECS
                );
                DEFAULT_HTTP_TIMEOUT_SECS
            }
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        Duration::from_secs(secs)
    }

    /// Description documents fetched at bootstrap, in order.
    ///
    /// The first one describes the root device.
    pub fn get_description_files(&self) -> Vec<String> {
        let defaults = || DEFAULT_DESCRIPTIONS.iter().map(|s| s.to_string()).collect();

        match self.get_value(&["device", "descriptions"]) {
            Ok(Value::Sequence(seq)) => {
                let files: Vec<String> = seq
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().trim_start_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if files.is_empty() {
                    warn!("No description files configured, using defaults");
                    defaults()
                } else {
                    files
                }
            }
            Ok(Value::String(s)) if !s.trim().is_empty() => {
                vec![s.trim().trim_start_matches('/').to_string()]
            }
            _ => defaults(),
        }
    }
}

/// Returns the global configuration instance, lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
