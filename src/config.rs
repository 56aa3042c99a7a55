use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "snipvault")]
#[command(about = "Runs the snipvault pastebin service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<PathBuf>,

    /// Interface to bind (default: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (default: 8000)
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the JSON backing file
    #[arg(long = "db")]
    pub database: Option<PathBuf>,

    /// Seconds after which snippets are hidden, 0 disables expiry
    #[arg(long = "ttl")]
    pub ttl_seconds: Option<i64>,

    /// Directory served for non-API paths
    #[arg(long = "assets")]
    pub assets_dir: Option<PathBuf>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".snipvault")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct App {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub ttl_seconds: i64,
    pub assets_dir: PathBuf,
}

impl Default for App {
    fn default() -> Self {
        App {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database: PathBuf::from("data").join("snips.json"),
            ttl_seconds: 0,
            assets_dir: PathBuf::from("web"),
        }
    }
}

impl App {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// Builds the startup configuration: file (explicit or the default location
    /// if present), then command line overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config_path {
            Some(path) => Config::new(&path.to_string_lossy())
                .with_context(|| format!("failed to load config file {:?}", path))?,
            None => {
                let path = default_config_path();
                if path.is_file() {
                    Config::new(&path.to_string_lossy())?
                } else {
                    Config::default()
                }
            }
        };
        cfg.apply_overrides(cli);
        Ok(cfg)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.app.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.app.port = port;
        }
        if let Some(database) = &cli.database {
            self.app.database = database.clone();
        }
        if let Some(ttl) = cli.ttl_seconds {
            self.app.ttl_seconds = ttl;
        }
        if let Some(assets) = &cli.assets_dir {
            self.app.assets_dir = assets.clone();
        }
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        // An empty document deserializes as unit, not a map.
        if yaml_with_env.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
