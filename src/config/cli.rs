use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the tourguard binary.
#[derive(Debug, Parser)]
#[command(name = "tourguard", version, about = "Tourist location-intelligence server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TOURGUARD_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub api_keys: ApiKeyArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Upstream credentials. Global so they apply with or without a subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct ApiKeyArgs {
    /// API key for the places directory.
    #[arg(
        long = "opentripmap-api-key",
        env = "OPENTRIPMAP_API_KEY",
        value_name = "KEY",
        global = true
    )]
    pub opentripmap_api_key: Option<String>,

    /// API key for the weather provider.
    #[arg(
        long = "weather-api-key",
        env = "WEATHER_API_KEY",
        value_name = "KEY",
        global = true
    )]
    pub weather_api_key: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Resolve one location against the live upstreams and print the result as JSON.
    Lookup(LookupArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct LookupArgs {
    #[command(flatten)]
    pub upstream: UpstreamOverrides,

    /// Latitude of the point to resolve (requires --lon).
    #[arg(long, requires = "lon", conflicts_with = "name", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the point to resolve (requires --lat).
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Free-text place name to search instead of coordinates.
    #[arg(long, required_unless_present = "lat")]
    pub name: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct UpstreamOverrides {
    /// Override the reverse-geocoding base URL.
    #[arg(long = "nominatim-base-url", value_name = "URL")]
    pub nominatim_base_url: Option<String>,

    /// Override the places directory base URL.
    #[arg(long = "opentripmap-base-url", value_name = "URL")]
    pub opentripmap_base_url: Option<String>,

    /// Override the weather provider base URL.
    #[arg(long = "openweather-base-url", value_name = "URL")]
    pub openweather_base_url: Option<String>,

    /// Override the User-Agent sent to upstream services.
    #[arg(long = "upstream-user-agent", value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Override the default upstream request timeout.
    #[arg(long = "upstream-request-timeout-seconds", value_name = "SECONDS")]
    pub request_timeout_seconds: Option<u64>,

    /// Override the reverse-geocoding timeout.
    #[arg(long = "upstream-region-timeout-seconds", value_name = "SECONDS")]
    pub region_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub upstream: UpstreamOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the time-to-live of cached lookups.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the capacity of the coordinate → region cache.
    #[arg(long = "cache-region-capacity", value_name = "COUNT")]
    pub cache_region_capacity: Option<usize>,

    /// Override the capacity of the region → places cache.
    #[arg(long = "cache-places-capacity", value_name = "COUNT")]
    pub cache_places_capacity: Option<usize>,

    /// Override the capacity of the name-search cache.
    #[arg(long = "cache-search-capacity", value_name = "COUNT")]
    pub cache_search_capacity: Option<usize>,

    /// Override the number of concurrent place-detail requests per aggregation.
    #[arg(long = "places-enrichment-concurrency", value_name = "COUNT")]
    pub places_enrichment_concurrency: Option<usize>,

    /// Override the rate limit window size.
    #[arg(long = "rate-limit-window-seconds", value_name = "SECONDS")]
    pub rate_limit_window_seconds: Option<u64>,

    /// Override the rate limit request ceiling.
    #[arg(long = "rate-limit-max-requests", value_name = "COUNT")]
    pub rate_limit_max_requests: Option<u64>,
}
