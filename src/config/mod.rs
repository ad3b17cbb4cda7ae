//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{
    ApiKeyArgs, CliArgs, Command, LookupArgs, ServeArgs, ServeOverrides, UpstreamOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tourguard";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org/";
const DEFAULT_OPENTRIPMAP_BASE_URL: &str = "https://api.opentripmap.com/0.1/en/";
const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/";
const DEFAULT_USER_AGENT: &str = concat!("tourguard/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REGION_TIMEOUT_SECS: u64 = 6;
const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CACHE_REGION_CAPACITY: usize = 4096;
const DEFAULT_CACHE_PLACES_CAPACITY: usize = 512;
const DEFAULT_CACHE_SEARCH_CAPACITY: usize = 1024;
const DEFAULT_REGION_RADIUS_METERS: u32 = 150_000;
const DEFAULT_SEARCH_RADIUS_METERS: u32 = 10_000;
const DEFAULT_MIN_RATING: u8 = 3;
const DEFAULT_KINDS: &str =
    "interesting_places,tourist_facilities,monuments_and_memorials,museums,architecture,natural";
const DEFAULT_REGION_CANDIDATE_LIMIT: u32 = 30;
const DEFAULT_SEARCH_CANDIDATE_LIMIT: u32 = 20;
const DEFAULT_TOP_N: usize = 10;
const MAX_TOP_N: usize = 10;
const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 3;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 120;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub places: PlacesSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Where the third-party services live and how they are called.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub nominatim_base_url: Url,
    pub opentripmap_base_url: Url,
    pub opentripmap_api_key: Option<String>,
    pub openweather_base_url: Url,
    pub weather_api_key: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub region_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub region_capacity: NonZeroUsize,
    pub places_capacity: NonZeroUsize,
    pub search_capacity: NonZeroUsize,
}

/// Knobs of the attraction search and ranking pipeline.
#[derive(Debug, Clone)]
pub struct PlacesSettings {
    pub region_radius_meters: NonZeroU32,
    pub search_radius_meters: NonZeroU32,
    pub min_rating: u8,
    pub kinds: String,
    pub region_candidate_limit: NonZeroU32,
    pub search_candidate_limit: NonZeroU32,
    pub top_n: NonZeroUsize,
    pub enrichment_concurrency: NonZeroUsize,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            region_radius_meters: NonZeroU32::new(DEFAULT_REGION_RADIUS_METERS)
                .unwrap_or(NonZeroU32::MIN),
            search_radius_meters: NonZeroU32::new(DEFAULT_SEARCH_RADIUS_METERS)
                .unwrap_or(NonZeroU32::MIN),
            min_rating: DEFAULT_MIN_RATING,
            kinds: DEFAULT_KINDS.to_string(),
            region_candidate_limit: NonZeroU32::new(DEFAULT_REGION_CANDIDATE_LIMIT)
                .unwrap_or(NonZeroU32::MIN),
            search_candidate_limit: NonZeroU32::new(DEFAULT_SEARCH_CANDIDATE_LIMIT)
                .unwrap_or(NonZeroU32::MIN),
            top_n: NonZeroUsize::new(DEFAULT_TOP_N).unwrap_or(NonZeroUsize::MIN),
            enrichment_concurrency: NonZeroUsize::new(DEFAULT_ENRICHMENT_CONCURRENCY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window_seconds: NonZeroU32,
    pub max_requests: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TOURGUARD").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Lookup(args)) => raw.apply_upstream_overrides(&args.upstream),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }
    raw.apply_api_keys(&cli.api_keys);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    upstream: RawUpstreamSettings,
    cache: RawCacheSettings,
    places: RawPlacesSettings,
    rate_limit: RawRateLimitSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(capacity) = overrides.cache_region_capacity {
            self.cache.region_capacity = Some(capacity);
        }
        if let Some(capacity) = overrides.cache_places_capacity {
            self.cache.places_capacity = Some(capacity);
        }
        if let Some(capacity) = overrides.cache_search_capacity {
            self.cache.search_capacity = Some(capacity);
        }
        if let Some(value) = overrides.places_enrichment_concurrency {
            self.places.enrichment_concurrency = Some(value);
        }
        if let Some(window) = overrides.rate_limit_window_seconds {
            self.rate_limit.window_seconds = Some(window);
        }
        if let Some(max) = overrides.rate_limit_max_requests {
            self.rate_limit.max_requests = Some(max);
        }

        self.apply_upstream_overrides(&overrides.upstream);
    }

    fn apply_api_keys(&mut self, keys: &ApiKeyArgs) {
        if let Some(key) = keys.opentripmap_api_key.as_ref() {
            self.upstream.opentripmap_api_key = Some(key.clone());
        }
        if let Some(key) = keys.weather_api_key.as_ref() {
            self.upstream.weather_api_key = Some(key.clone());
        }
    }

    fn apply_upstream_overrides(&mut self, overrides: &UpstreamOverrides) {
        if let Some(url) = overrides.nominatim_base_url.as_ref() {
            self.upstream.nominatim_base_url = Some(url.clone());
        }
        if let Some(url) = overrides.opentripmap_base_url.as_ref() {
            self.upstream.opentripmap_base_url = Some(url.clone());
        }
        if let Some(url) = overrides.openweather_base_url.as_ref() {
            self.upstream.openweather_base_url = Some(url.clone());
        }
        if let Some(agent) = overrides.user_agent.as_ref() {
            self.upstream.user_agent = Some(agent.clone());
        }
        if let Some(seconds) = overrides.request_timeout_seconds {
            self.upstream.request_timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.region_timeout_seconds {
            self.upstream.region_timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            upstream,
            cache,
            places,
            rate_limit,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let upstream = build_upstream_settings(upstream)?;
        let cache = build_cache_settings(cache)?;
        let places = build_places_settings(places)?;
        let rate_limit = build_rate_limit_settings(rate_limit)?;

        Ok(Self {
            server,
            logging,
            upstream,
            cache,
            places,
            rate_limit,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let nominatim_base_url = parse_base_url(
        upstream.nominatim_base_url.as_deref(),
        DEFAULT_NOMINATIM_BASE_URL,
        "upstream.nominatim_base_url",
    )?;
    let opentripmap_base_url = parse_base_url(
        upstream.opentripmap_base_url.as_deref(),
        DEFAULT_OPENTRIPMAP_BASE_URL,
        "upstream.opentripmap_base_url",
    )?;
    let openweather_base_url = parse_base_url(
        upstream.openweather_base_url.as_deref(),
        DEFAULT_OPENWEATHER_BASE_URL,
        "upstream.openweather_base_url",
    )?;

    let user_agent = upstream
        .user_agent
        .map(|agent| agent.trim().to_string())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    if user_agent.is_empty() {
        return Err(LoadError::invalid(
            "upstream.user_agent",
            "must not be empty",
        ));
    }

    let request_timeout = non_zero_seconds(
        upstream
            .request_timeout_seconds
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        "upstream.request_timeout_seconds",
    )?;
    let region_timeout = non_zero_seconds(
        upstream
            .region_timeout_seconds
            .unwrap_or(DEFAULT_REGION_TIMEOUT_SECS),
        "upstream.region_timeout_seconds",
    )?;

    Ok(UpstreamSettings {
        nominatim_base_url,
        opentripmap_base_url,
        opentripmap_api_key: non_blank(upstream.opentripmap_api_key),
        openweather_base_url,
        weather_api_key: non_blank(upstream.weather_api_key),
        user_agent,
        request_timeout,
        region_timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl = non_zero_seconds(
        cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        "cache.ttl_seconds",
    )?;

    Ok(CacheSettings {
        ttl,
        region_capacity: non_zero_usize(
            cache.region_capacity.unwrap_or(DEFAULT_CACHE_REGION_CAPACITY),
            "cache.region_capacity",
        )?,
        places_capacity: non_zero_usize(
            cache.places_capacity.unwrap_or(DEFAULT_CACHE_PLACES_CAPACITY),
            "cache.places_capacity",
        )?,
        search_capacity: non_zero_usize(
            cache.search_capacity.unwrap_or(DEFAULT_CACHE_SEARCH_CAPACITY),
            "cache.search_capacity",
        )?,
    })
}

fn build_places_settings(places: RawPlacesSettings) -> Result<PlacesSettings, LoadError> {
    let min_rating = places.min_rating.unwrap_or(DEFAULT_MIN_RATING);
    let top_n = non_zero_usize(places.top_n.unwrap_or(DEFAULT_TOP_N), "places.top_n")?;
    if top_n.get() > MAX_TOP_N {
        return Err(LoadError::invalid("places.top_n", "must be at most 10"));
    }
    if min_rating > 7 {
        return Err(LoadError::invalid(
            "places.min_rating",
            "rating must be between 0 and 7",
        ));
    }

    let kinds = places
        .kinds
        .map(|kinds| kinds.trim().to_string())
        .unwrap_or_else(|| DEFAULT_KINDS.to_string());
    if kinds.is_empty() {
        return Err(LoadError::invalid("places.kinds", "must not be empty"));
    }

    Ok(PlacesSettings {
        region_radius_meters: non_zero_u32(
            places
                .region_radius_meters
                .unwrap_or(DEFAULT_REGION_RADIUS_METERS)
                .into(),
            "places.region_radius_meters",
        )?,
        search_radius_meters: non_zero_u32(
            places
                .search_radius_meters
                .unwrap_or(DEFAULT_SEARCH_RADIUS_METERS)
                .into(),
            "places.search_radius_meters",
        )?,
        min_rating,
        kinds,
        region_candidate_limit: non_zero_u32(
            places
                .region_candidate_limit
                .unwrap_or(DEFAULT_REGION_CANDIDATE_LIMIT)
                .into(),
            "places.region_candidate_limit",
        )?,
        search_candidate_limit: non_zero_u32(
            places
                .search_candidate_limit
                .unwrap_or(DEFAULT_SEARCH_CANDIDATE_LIMIT)
                .into(),
            "places.search_candidate_limit",
        )?,
        top_n,
        enrichment_concurrency: non_zero_usize(
            places
                .enrichment_concurrency
                .unwrap_or(DEFAULT_ENRICHMENT_CONCURRENCY),
            "places.enrichment_concurrency",
        )?,
    })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let window_seconds_val = rate_limit
        .window_seconds
        .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);
    let window_seconds = non_zero_u32(window_seconds_val, "rate_limit.window_seconds")?;

    let max_requests_val = rate_limit
        .max_requests
        .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    let max_requests = non_zero_u32(max_requests_val, "rate_limit.max_requests")?;

    Ok(RateLimitSettings {
        window_seconds,
        max_requests,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    nominatim_base_url: Option<String>,
    opentripmap_base_url: Option<String>,
    opentripmap_api_key: Option<String>,
    openweather_base_url: Option<String>,
    weather_api_key: Option<String>,
    user_agent: Option<String>,
    request_timeout_seconds: Option<u64>,
    region_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
    region_capacity: Option<usize>,
    places_capacity: Option<usize>,
    search_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPlacesSettings {
    region_radius_meters: Option<u32>,
    search_radius_meters: Option<u32>,
    min_rating: Option<u8>,
    kinds: Option<String>,
    region_candidate_limit: Option<u32>,
    search_candidate_limit: Option<u32>,
    top_n: Option<usize>,
    enrichment_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Parse a base URL, forcing a trailing slash so relative endpoint paths join beneath it.
fn parse_base_url(
    value: Option<&str>,
    default: &str,
    key: &'static str,
) -> Result<Url, LoadError> {
    let raw = value.map(str::trim).unwrap_or(default);
    let mut url = Url::parse(raw).map_err(|err| LoadError::invalid(key, err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(LoadError::invalid(key, "url cannot be used as a base"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_usize(value: usize, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
