use crate::domain::batch::DispatchMode;
use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub dispatch: DispatchConfig,

    #[command(flatten)]
    pub feed: FeedConfig,

    #[command(flatten)]
    pub transport: TransportConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "SHEET_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SHEET_RELAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "SHEET_RELAY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for background tasks during shutdown
    #[arg(long, env = "SHEET_RELAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DispatchConfig {
    /// How feed rows are expanded into deliveries
    #[arg(long, env = "SHEET_RELAY_DISPATCH_MODE", value_enum, default_value_t = DispatchMode::CrossProduct)]
    pub mode: DispatchMode,

    /// Country code prepended to recipients that lack it
    #[arg(long, env = "SHEET_RELAY_COUNTRY_CODE", default_value = "55", value_parser = parse_country_code)]
    pub country_code: String,

    /// Suffix appended to a normalized recipient to form the transport chat id
    #[arg(long, env = "SHEET_RELAY_CHAT_ID_SUFFIX", default_value = "@c.us")]
    pub chat_id_suffix: String,

    /// Pause between two messages for the same recipient
    #[arg(long, env = "SHEET_RELAY_INTRA_RECIPIENT_DELAY_MS", default_value_t = 500)]
    pub intra_recipient_delay_ms: u64,

    /// Pause before moving on to the next recipient (or the next row in paired mode)
    #[arg(long, env = "SHEET_RELAY_INTER_RECIPIENT_DELAY_MS", default_value_t = 1000)]
    pub inter_recipient_delay_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct FeedConfig {
    /// Base URL of the spreadsheet CSV export endpoint
    #[arg(long = "feed-export-base-url", env = "SHEET_RELAY_FEED_EXPORT_BASE_URL", default_value = "https://docs.google.com")]
    pub export_base_url: String,

    /// Timeout for establishing the feed download
    #[arg(long = "feed-fetch-timeout-secs", env = "SHEET_RELAY_FEED_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Longest silence tolerated while streaming the feed body
    #[arg(long = "feed-read-timeout-secs", env = "SHEET_RELAY_FEED_READ_TIMEOUT_SECS", default_value_t = 30)]
    pub read_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct TransportConfig {
    /// Base URL of the messaging bridge that owns the client session
    #[arg(long = "transport-bridge-url", env = "SHEET_RELAY_TRANSPORT_BRIDGE_URL", default_value = "http://127.0.0.1:3001")]
    pub bridge_url: String,

    /// Timeout for a single send through the bridge
    #[arg(long = "transport-request-timeout-secs", env = "SHEET_RELAY_TRANSPORT_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How often to poll the bridge for the session status
    #[arg(long = "transport-poll-interval-secs", env = "SHEET_RELAY_TRANSPORT_POLL_INTERVAL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "SHEET_RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "SHEET_RELAY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

fn parse_country_code(value: &str) -> Result<String, String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("country code must contain only digits, got {value:?}"));
    }
    Ok(value.to_owned())
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_accepts_digits() {
        let config = Config::try_parse_from(["sheet-relay", "--country-code", "351"]).unwrap();
        assert_eq!(config.dispatch.country_code, "351");
    }

    #[test]
    fn test_country_code_rejects_non_digits() {
        for bad in ["+55", "", "5 5", "br"] {
            assert!(
                Config::try_parse_from(["sheet-relay", "--country-code", bad]).is_err(),
                "country code {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_feed_timeouts_are_configurable() {
        let config = Config::try_parse_from([
            "sheet-relay",
            "--feed-fetch-timeout-secs",
            "3",
            "--feed-read-timeout-secs",
            "7",
        ])
        .unwrap();
        assert_eq!(config.feed.fetch_timeout_secs, 3);
        assert_eq!(config.feed.read_timeout_secs, 7);
    }
}
