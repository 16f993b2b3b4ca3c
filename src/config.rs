/// Runtime configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Optional key for the identifier mapping API. Without it requests
    /// run at the anonymous rate limit.
    pub openfigi_api_key: Option<String>,
    /// Exchange suffixes tried in order until one market returns data.
    pub market_suffixes: Vec<String>,
    pub max_upload_bytes: u64,
    /// How many holdings are looked up against the external APIs at once.
    pub lookup_concurrency: usize,
    /// When false the worth series carries year-end samples only, which
    /// quarters the number of chart points for large portfolios.
    pub intra_year_checkpoints: bool,
}

const DEFAULT_MARKET_SUFFIXES: &str = "AS,DE,XC,MI,XD,AQ,L";

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            openfigi_api_key: std::env::var("OPENFIGI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            market_suffixes: parse_suffix_list(
                &std::env::var("MARKET_SUFFIXES")
                    .unwrap_or_else(|_| DEFAULT_MARKET_SUFFIXES.to_string()),
            ),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000_000),
            lookup_concurrency: std::env::var("LOOKUP_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            intra_year_checkpoints: std::env::var("INTRA_YEAR_CHECKPOINTS")
                .map(|v| v != "false")
                .unwrap_or(true),
        }
    }
}

fn parse_suffix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
