use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub threshold: ThresholdConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnnotationConfig {
    pub font_path: PathBuf,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub labels_file: Option<PathBuf>,
}

fn default_font_size() -> f32 {
    20.0
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThresholdConfig {
    #[serde(default = "default_threshold")]
    pub default: f32,
    #[serde(default = "default_min_threshold")]
    pub min: f32,
    #[serde(default = "default_max_threshold")]
    pub max: f32,
}

fn default_threshold() -> f32 {
    0.5
}

fn default_min_threshold() -> f32 {
    0.1
}

fn default_max_threshold() -> f32 {
    1.0
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            default: default_threshold(),
            min: default_min_threshold(),
            max: default_max_threshold(),
        }
    }
}

impl ThresholdConfig {
    pub fn contains(&self, threshold: f32) -> bool {
        (self.min..=self.max).contains(&threshold)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.min <= self.default && self.default <= self.max) {
            return Err(format!(
                "Threshold default {} must lie within [{}, {}]",
                self.default, self.min, self.max
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("OA")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;
    config
        .threshold
        .validate()
        .map_err(config::ConfigError::Message)?;

    Ok(config)
}
