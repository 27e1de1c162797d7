use alma_core::services::DEFAULT_BATCH_CONCURRENCY;
use clap::{Parser, builder::BoolishValueParser};
use reqwest::Url;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_TAP_URL: &str = "https://almascience.eso.org/tap";
const DEFAULT_SIA_URL: &str = "https://almascience.eso.org/sia2";
const DEFAULT_RESOLVER_URL: &str = "https://cds.unistra.fr/cgi-bin/nph-sesame/-ox/SNV";
const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4030";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "alma-mcpd", version, about = "ALMA archive MCP daemon.")]
#[allow(clippy::struct_excessive_bools)]
struct CliArgs {
    #[arg(long, env = "ALMA_TAP_URL", default_value = DEFAULT_TAP_URL)]
    tap_url: String,

    #[arg(long, env = "ALMA_SIA_URL", default_value = DEFAULT_SIA_URL)]
    sia_url: String,

    #[arg(long, env = "ALMA_RESOLVER_URL", default_value = DEFAULT_RESOLVER_URL)]
    resolver_url: String,

    #[arg(
        long,
        env = "ALMA_ENABLE_TAP",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    enable_tap: bool,

    #[arg(
        long,
        env = "ALMA_ENABLE_CONE_SEARCH",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    enable_cone_search: bool,

    #[arg(
        long,
        env = "ALMA_ENABLE_RESOLVER",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    enable_resolver: bool,

    #[arg(
        long,
        env = "ALMA_CONNECT_TIMEOUT_SECS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
    )]
    connect_timeout_secs: u64,

    #[arg(
        long,
        env = "ALMA_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long,
        env = "ALMA_BATCH_CONCURRENCY",
        default_value_t = DEFAULT_BATCH_CONCURRENCY
    )]
    batch_concurrency: usize,

    /// Extra tables raw queries may read; `schema.*` allows a whole schema.
    #[arg(long, env = "ALMA_RAW_QUERY_TABLES", value_delimiter = ',')]
    raw_query_tables: Vec<String>,

    #[arg(
        long = "stdio",
        env = "ALMA_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(long, env = "ALMA_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(
        long,
        env = "ALMA_MCP_STATEFUL",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    stateful_mode: bool,

    #[arg(long, env = "ALMA_LOG", default_value = DEFAULT_LOG_FILTER)]
    log: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
///
/// A service whose URL is `None` is disabled.
#[derive(Debug, Clone)]
pub struct AlmaConfig {
    pub tap_url: Option<Url>,
    pub sia_url: Option<Url>,
    pub resolver_url: Option<Url>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub batch_concurrency: usize,
    pub raw_query_tables: Vec<String>,
    pub enable_stdio: bool,
    pub mcp_http_addr: SocketAddr,
    pub stateful_mode: bool,
    pub log_filter: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl AlmaConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

fn service_url(
    enabled: bool,
    name: &'static str,
    value: &str,
) -> Result<Option<Url>, ConfigError> {
    if !enabled {
        return Ok(None);
    }
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::MissingSetting(name));
    }
    Url::parse(value)
        .map(Some)
        .map_err(|_| ConfigError::InvalidSetting {
            name,
            value: value.to_string(),
        })
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

impl TryFrom<CliArgs> for AlmaConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let tap_url = service_url(args.enable_tap, "ALMA_TAP_URL", &args.tap_url)?;
        let sia_url = service_url(args.enable_cone_search, "ALMA_SIA_URL", &args.sia_url)?;
        let resolver_url =
            service_url(args.enable_resolver, "ALMA_RESOLVER_URL", &args.resolver_url)?;

        if args.batch_concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "ALMA_BATCH_CONCURRENCY",
                value: args.batch_concurrency.to_string(),
            });
        }
        if args.log.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "ALMA_LOG",
                value: args.log,
            });
        }

        let raw_query_tables = args
            .raw_query_tables
            .into_iter()
            .map(|table| table.trim().to_string())
            .filter(|table| !table.is_empty())
            .collect();

        Ok(Self {
            tap_url,
            sia_url,
            resolver_url,
            connect_timeout: positive_secs("ALMA_CONNECT_TIMEOUT_SECS", args.connect_timeout_secs)?,
            request_timeout: positive_secs("ALMA_REQUEST_TIMEOUT_SECS", args.request_timeout_secs)?,
            batch_concurrency: args.batch_concurrency,
            raw_query_tables,
            enable_stdio: args.enable_stdio,
            mcp_http_addr: args.mcp_http_addr,
            stateful_mode: args.stateful_mode,
            log_filter: args.log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            tap_url: DEFAULT_TAP_URL.to_string(),
            sia_url: DEFAULT_SIA_URL.to_string(),
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            enable_tap: true,
            enable_cone_search: true,
            enable_resolver: true,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            raw_query_tables: Vec::new(),
            enable_stdio: false,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            stateful_mode: true,
            log: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    #[test]
    fn defaults_enable_every_service() {
        let config = AlmaConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(
            config.tap_url.as_ref().map(Url::as_str),
            Some("https://almascience.eso.org/tap")
        );
        assert!(config.sia_url.is_some());
        assert!(config.resolver_url.is_some());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.mcp_http_addr.port(), 4030);
        assert_eq!(config.batch_concurrency, 4);
    }

    #[test]
    fn disabled_services_ignore_their_urls() {
        let mut args = base_args();
        args.enable_cone_search = false;
        args.sia_url = String::new();

        let config = AlmaConfig::try_from(args).expect("config should parse");

        assert!(config.sia_url.is_none());
        assert!(config.tap_url.is_some());
    }

    #[test]
    fn rejects_empty_urls_and_zero_limits() {
        let mut args = base_args();
        args.tap_url = "  ".to_string();
        assert!(matches!(
            AlmaConfig::try_from(args),
            Err(ConfigError::MissingSetting("ALMA_TAP_URL"))
        ));

        let mut args = base_args();
        args.resolver_url = "not a url".to_string();
        assert!(matches!(
            AlmaConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "ALMA_RESOLVER_URL", .. })
        ));

        let mut args = base_args();
        args.batch_concurrency = 0;
        assert!(AlmaConfig::try_from(args).is_err());

        let mut args = base_args();
        args.request_timeout_secs = 0;
        assert!(AlmaConfig::try_from(args).is_err());
    }

    #[test]
    fn raw_query_tables_are_trimmed() {
        let mut args = base_args();
        args.raw_query_tables = vec![" ivoa.ObsCore ".to_string(), String::new(), "alma.*".to_string()];

        let config = AlmaConfig::try_from(args).expect("config should parse");

        assert_eq!(config.raw_query_tables, vec!["ivoa.ObsCore", "alma.*"]);
    }
}
