use std::{str::FromStr, time::Duration};

/// Settings for the stream URL resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Network hops allowed per chain before giving up.
    pub max_hops: usize,
    pub hop_timeout: Duration,
    /// Wall-clock budget for a whole chain.
    pub total_timeout: Duration,
    /// Chains in flight at once when resolving many channels.
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_hops: 16,
            hop_timeout: Duration::from_secs(10),
            total_timeout: Duration::from_secs(60),
            concurrency: 16,
            user_agent: "VLC".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_hops: env_or("RESOLVE_MAX_HOPS", defaults.max_hops).max(1),
            hop_timeout: Duration::from_secs(
                env_or("RESOLVE_HOP_TIMEOUT_SECS", defaults.hop_timeout.as_secs()).max(1),
            ),
            total_timeout: Duration::from_secs(
                env_or("RESOLVE_TOTAL_TIMEOUT_SECS", defaults.total_timeout.as_secs()).max(1),
            ),
            concurrency: env_or("RESOLVE_CONCURRENCY", defaults.concurrency).max(1),
            user_agent: std::env::var("RESOLVE_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// Settings for the XMLTV document.
#[derive(Debug, Clone)]
pub struct XmltvConfig {
    pub lang: String,
    pub country: String,
    pub source_info_name: String,
    pub generator_info_name: String,
    pub generator_info_url: String,
    /// Extra hour offsets; each one duplicates every channel.
    pub shifts: Vec<i64>,
}

impl Default for XmltvConfig {
    fn default() -> Self {
        Self {
            lang: "it".to_string(),
            country: "IT".to_string(),
            source_info_name: "EPG".to_string(),
            generator_info_name: "simple tv grab it".to_string(),
            generator_info_url: String::new(),
            shifts: Vec::new(),
        }
    }
}

impl XmltvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lang: std::env::var("XMLTV_LANG").unwrap_or(defaults.lang),
            country: std::env::var("XMLTV_COUNTRY").unwrap_or(defaults.country),
            shifts: std::env::var("XMLTV_SHIFTS")
                .map(|s| parse_shifts(&s))
                .unwrap_or_default(),
            ..defaults
        }
    }
}

/// Largest EPG body `POST /xmltv` accepts. A week of guide data with
/// descriptions runs to tens of megabytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub resolver: ResolverConfig,
    pub xmltv: XmltvConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8080),
            max_body_bytes: env_or("XMLTV_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES).max(1),
            resolver: ResolverConfig::from_env(),
            xmltv: XmltvConfig::from_env(),
        }
    }
}

/// Parse a comma separated list of hour offsets, skipping junk.
pub fn parse_shifts(s: &str) -> Vec<i64> {
    s.split(',')
        .filter_map(|part| part.trim().trim_start_matches('+').parse().ok())
        .collect()
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
