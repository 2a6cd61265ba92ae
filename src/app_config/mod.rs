use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};

#[derive(Debug, serde::Deserialize, Clone)]
pub struct Conf {
    pub host: String,
    pub port: u16,
    pub kafka_brokers: String,
    pub kafka_topic: String,
    pub kafka_client_id: String,
    pub kafka_consumer_client_id: String,
    pub kafka_group_id: String,
    pub kafka_send_timeout_ms: u64,
    pub db_url: String,
    pub db_dc: String,
    pub schema_file: String,
    pub redis_url: String,
    pub cache_ttl_secs: u64,
    pub summary_api_key: Option<String>,
    pub summary_endpoint: String,
    pub summary_model: String,
    pub summary_timeout_ms: u64,
}

impl Conf {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn kafka_send_timeout(&self) -> Duration {
        Duration::from_millis(self.kafka_send_timeout_ms)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_millis(self.summary_timeout_ms)
    }

    /// API key for summaries; an empty value counts as unset.
    pub fn summary_key(&self) -> Option<&str> {
        self.summary_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Layered configuration. Later layers win: defaults, then files, then the
/// environment (keys lower-cased, `.env` honoured).
pub struct AppConfig {
    conf: Config,
}

impl AppConfig {
    pub fn init() -> Self {
        Self {
            conf: Config::new(),
        }
    }

    pub fn with_defaults(mut self) -> Result<Self, ConfigError> {
        self.conf
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001i64)?
            .set_default("kafka_brokers", "localhost:9092")?
            .set_default("kafka_topic", "user-views")?
            .set_default("kafka_client_id", "personalization-platform")?
            .set_default("kafka_consumer_client_id", "event-consumer")?
            .set_default("kafka_group_id", "analytics-group")?
            .set_default("kafka_send_timeout_ms", 5000i64)?
            .set_default("db_url", "localhost:9042")?
            .set_default("db_dc", "datacenter1")?
            .set_default("schema_file", "schema.cql")?
            .set_default("redis_url", "redis://localhost:6379")?
            .set_default("cache_ttl_secs", 3600i64)?
            .set_default(
                "summary_endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("summary_model", "gemini-1.5-flash")?
            .set_default("summary_timeout_ms", 10000i64)?;
        Ok(self)
    }

    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        self.conf.merge(Environment::new())?;
        Ok(self)
    }

    /// Merges `filename` if it exists.
    pub fn from_file(mut self, filename: &str, file_format: FileFormat) -> Result<Self, ConfigError> {
        self.conf
            .merge(File::new(filename, file_format).required(false))?;
        Ok(self)
    }

    pub fn parse(self) -> Result<Conf, ConfigError> {
        self.conf.try_into()
    }
}

/// Configuration for both binaries: defaults, `config.json`, environment.
pub fn load() -> Result<Conf, ConfigError> {
    AppConfig::init()
        .with_defaults()?
        .from_file("config.json", FileFormat::Json)?
        .from_env()?
        .parse()
}
