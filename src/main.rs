use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use tokio::signal;
use tourguard::{
    application::{
        error::AppError,
        location::LocationService,
        place_info::PlaceInfoService,
        places::PlaceAggregator,
        region::RegionResolver,
        search::{PlaceSearch, PlaceSearchOutcome},
        weather::WeatherService,
    },
    cache::LocationCaches,
    config,
    domain::{error::DomainError, geo::Coordinates},
    infra::{
        error::InfraError,
        http::{self, ApiRateLimiter, ApiState},
        telemetry,
        upstream::{NominatimClient, OpenTripMapClient, OpenWeatherClient, UpstreamClient},
    },
};
use tourguard_api_types as wire;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Lookup(args) => run_lookup(settings, args).await,
    }
}

struct ApplicationContext {
    location: Arc<LocationService>,
    search: Arc<PlaceSearch>,
    place_info: Arc<PlaceInfoService>,
    weather: Arc<WeatherService>,
}

fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let upstream = &settings.upstream;
    let http_client = UpstreamClient::new(upstream)?;

    let geocoder = Arc::new(NominatimClient::new(
        http_client.clone(),
        upstream.nominatim_base_url.clone(),
    ));
    let directory = Arc::new(OpenTripMapClient::new(
        http_client.clone(),
        upstream.opentripmap_base_url.clone(),
        upstream.opentripmap_api_key.clone(),
    ));
    let forecasts = Arc::new(OpenWeatherClient::new(
        http_client,
        upstream.openweather_base_url.clone(),
        upstream.weather_api_key.clone(),
    ));

    let caches = LocationCaches::new(&settings.cache);

    let resolver = RegionResolver::new(geocoder, caches.regions.clone(), upstream.region_timeout);
    let aggregator = PlaceAggregator::new(
        directory.clone(),
        caches.places.clone(),
        settings.places.clone(),
    );

    Ok(ApplicationContext {
        location: Arc::new(LocationService::new(resolver, aggregator)),
        search: Arc::new(PlaceSearch::new(
            directory.clone(),
            caches.searches.clone(),
            settings.places.clone(),
        )),
        place_info: Arc::new(PlaceInfoService::new(directory)),
        weather: Arc::new(WeatherService::new(forecasts)),
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;

    let rate_limiter = ApiRateLimiter::new(
        Duration::from_secs(u64::from(settings.rate_limit.window_seconds.get())),
        settings.rate_limit.max_requests.get(),
    );

    let state = ApiState {
        location: app.location,
        search: app.search,
        place_info: app.place_info,
        weather: app.weather,
        rate_limiter: Arc::new(rate_limiter),
    };

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        addr = %settings.server.addr,
        opentripmap_configured = settings.upstream.opentripmap_api_key.is_some(),
        weather_configured = settings.upstream.weather_api_key.is_some(),
        "Listening"
    );

    let router = http::build_router(state);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn run_lookup(settings: config::Settings, args: config::LookupArgs) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;

    let rendered = match (args.lat, args.lon, args.name) {
        (Some(lat), Some(lon), _) => {
            let info = app.location.location_info(Coordinates::new(lat, lon)).await;
            to_pretty_json(&wire::LocationInfoResponse::from(info))?
        }
        (_, _, Some(name)) => match app.search.search_by_name(&name).await {
            PlaceSearchOutcome::Found(result) => {
                to_pretty_json(&wire::PlaceSearchResponse::from(result))?
            }
            PlaceSearchOutcome::NotFound => {
                return Err(AppError::unexpected(format!("place `{name}` not found")));
            }
            PlaceSearchOutcome::Unavailable => {
                return Err(AppError::unexpected("place search is unavailable"));
            }
        },
        _ => {
            return Err(AppError::from(DomainError::validation(
                "lookup requires --lat and --lon, or --name",
            )));
        }
    };

    println!("{rendered}");
    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))
}
