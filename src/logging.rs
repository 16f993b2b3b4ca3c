use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Where log records go: always the console, optionally a Grafana Loki
/// endpoint when the `loki` feature is compiled in and enabled by env.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .map(|v| v == "true")
                .unwrap_or(false),
            loki_url: std::env::var("LOKI_URL").ok(),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "gainscope".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    fn loki_url(&self) -> Result<Option<&str>, String> {
        match (self.loki_enabled, self.loki_url.as_deref()) {
            (false, _) => Ok(None),
            (true, Some(url)) => Ok(Some(url)),
            (true, None) => Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string()),
        }
    }
}

// RUST_LOG drives the filter; anything unset logs at info.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let loki_url = config.loki_url()?;

    #[cfg(feature = "loki")]
    {
        if let Some(url) = loki_url {
            let url = url::Url::parse(url)?;
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", &config.service_name)?
                .label("environment", &config.environment)?
                .build_url(url)?;

            // The shipper runs for the lifetime of the process.
            tokio::spawn(task);

            tracing_subscriber::registry()
                .with(env_filter())
                .with(tracing_subscriber::fmt::layer())
                .with(loki_layer)
                .init();
            tracing::info!("✅ Loki logging initialized");
            return Ok(());
        }
    }

    #[cfg(not(feature = "loki"))]
    let _ = loki_url;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> LoggingConfig {
        LoggingConfig {
            loki_enabled: false,
            loki_url: None,
            service_name: "gainscope".to_string(),
            environment: "test".to_string(),
        }
    }

    #[test]
    fn test_loki_requires_url() {
        let mut config = base_config();
        config.loki_enabled = true;
        assert!(config.loki_url().is_err());

        config.loki_url = Some("http://localhost:3100".to_string());
        assert_eq!(config.loki_url().unwrap(), Some("http://localhost:3100"));
    }

    #[test]
    fn test_disabled_loki_ignores_url() {
        let mut config = base_config();
        config.loki_url = Some("http://localhost:3100".to_string());
        assert_eq!(config.loki_url().unwrap(), None);
    }
}
