use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub service_name: String,
    pub environment: String,
    /// Loki push endpoint; `None` keeps logging on the console only.
    pub loki_url: Option<String>,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let loki_enabled = match get("LOKI_ENABLED").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => return Err(format!("LOKI_ENABLED must be true or false, got {}", other)),
        };
        let loki_url = get("LOKI_URL").filter(|url| !url.is_empty());
        if loki_enabled && loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }

        let config = Self {
            level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            service_name: get("SERVICE_NAME").unwrap_or_else(|| "ledgerline-backend".to_string()),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            loki_url: if loki_enabled { loki_url } else { None },
        };
        config.filter()?;
        Ok(config)
    }

    pub fn filter(&self) -> Result<EnvFilter, String> {
        EnvFilter::try_new(&self.level)
            .map_err(|e| format!("Invalid RUST_LOG directive '{}': {}", self.level, e))
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "loki")]
    {
        if let Some(loki_url) = config.loki_url.as_deref() {
            return init_with_loki(config, loki_url);
        }
    }

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "Console logging initialized at level {}",
        config.level
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: &LoggingConfig, loki_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered events to Loki for the life of the process.
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()?;

    tracing::info!("Loki logging initialized at {} for {}", loki_url, config.environment);
    Ok(())
}
