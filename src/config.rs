use crate::error::{AgroFusionError, Result};
use crate::models::Location;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".into(),
        "http://localhost:3000".into(),
    ]
}

fn default_body_limit() -> usize {
    16 * 1024
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(value) => value.trim().parse::<u16>().map_err(|_| {
            D::Error::custom(format!(
                "invalid port '{}' - ensure AGROFUSION_PORT environment variable is set",
                value
            ))
        }),
    }
}

/// The designated demo location. Queries that resolve nowhere fall back to it
/// on the single-response endpoint, and its fused record may be memoized.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_location_name")]
    pub location_name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_enabled")]
    pub memoize: bool,
    #[serde(default = "default_enabled")]
    pub fallback_to_default: bool,
}

impl DefaultsConfig {
    pub fn location(&self) -> Location {
        Location::new(&self.location_name, self.latitude, self.longitude)
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location_name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            memoize: true,
            fallback_to_default: true,
        }
    }
}

fn default_location_name() -> String {
    "Greater Noida, Uttar Pradesh".into()
}

fn default_latitude() -> f64 {
    28.47
}

fn default_longitude() -> f64 {
    77.50
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Upper bound for any single external call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub open_meteo: OpenMeteoConfig,
    #[serde(default)]
    pub nominatim: NominatimConfig,
    pub agromonitoring: Option<AgromonitoringConfig>,
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            open_meteo: OpenMeteoConfig::default(),
            nominatim: NominatimConfig::default(),
            agromonitoring: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenMeteoConfig {
    #[serde(default = "default_open_meteo_url")]
    pub base_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: default_open_meteo_url(),
            enabled: true,
        }
    }
}

fn default_open_meteo_url() -> String {
    "https://api.open-meteo.com/v1".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NominatimConfig {
    #[serde(default = "default_nominatim_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Appended to bare place names to bias forward geocoding
    #[serde(default = "default_country_hint")]
    pub country_hint: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            country_hint: default_country_hint(),
            enabled: true,
        }
    }
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".into()
}

fn default_user_agent() -> String {
    concat!("agrofusion/", env!("CARGO_PKG_VERSION")).into()
}

fn default_country_hint() -> Option<String> {
    Some("India".into())
}

#[derive(Clone, Deserialize, Serialize)]
pub struct AgromonitoringConfig {
    pub api_key: String,
    #[serde(default = "default_agro_url")]
    pub base_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_agro_url() -> String {
    "http://api.agromonitoring.com/agro/1.0".into()
}

impl std::fmt::Debug for AgromonitoringConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgromonitoringConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Config {
    /// Load configuration. An explicit path that does not exist is an error;
    /// when no file is found in the standard locations the built-in defaults apply.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(AgroFusionError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::info!("No config.yaml found - using built-in defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| AgroFusionError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::from_yaml(&config_str)?;
        tracing::info!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);
        serde_yaml::from_str(&content)
            .map_err(|e| AgroFusionError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Search for config.yaml in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("agrofusion").join("config.yaml"))
            .filter(|p| p.exists())
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return result,
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}
