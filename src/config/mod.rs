use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

const PORT_OVERRIDES: [(&str, &str); 2] = [
    ("PORT", "server.port"),
    ("METRICS_PORT", "metrics.port"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub admin_log: AdminLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

/// What to do when a handler argument cannot be encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentErrorPolicy {
    /// Log the failure and write the argument placeholder in its place.
    #[default]
    Placeholder,
    /// Fail the invocation before the handler runs.
    Propagate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminLogConfig {
    pub enabled: bool,
    pub pretty_json: bool,
    pub unknown_marker: String,
    pub response_placeholder: String,
    pub argument_placeholder: String,
    pub argument_errors: ArgumentErrorPolicy,
}

impl Default for AdminLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty_json: false,
            unknown_marker: "unknown".to_string(),
            response_placeholder: "Error converting response to JSON".to_string(),
            argument_placeholder: "Error converting argument to JSON".to_string(),
            argument_errors: ArgumentErrorPolicy::Placeholder,
        }
    }
}

impl AppConfig {
    /// Layers, lowest priority first: the YAML file at `CONFIG_PATH`, then
    /// `ADMIN_LOG__SECTION__KEY` variables, then the bare `HOST`, `PORT` and
    /// `METRICS_PORT` variables deployment tooling sets.
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("ADMIN_LOG").separator("__"));

        apply_env_overrides(builder, |name| std::env::var(name).ok())?
            .build()?
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", config_path))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>> {
    if let Some(host) = var("HOST") {
        builder = builder.set_override("server.host", host)?;
    }
    for (name, key) in PORT_OVERRIDES {
        if let Some(raw) = var(name) {
            let port: u16 = raw
                .parse()
                .with_context(|| format!("{} is not a valid port: {:?}", name, raw))?;
            builder = builder.set_override(key, i64::from(port))?;
        }
    }
    Ok(builder)
}
