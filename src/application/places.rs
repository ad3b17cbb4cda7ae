use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::METRIC_LOOKUP_DEGRADED;
use crate::application::fanout::run_bounded;
use crate::application::upstream::{PlacesDirectory, RadiusQuery, UpstreamError};
use crate::cache::PlacesCache;
use crate::config::PlacesSettings;
use crate::domain::geo::Region;
use crate::domain::places::{PlaceSummary, RankedPlace, rank_candidates};

/// How an aggregation was answered. Only `Fresh` results are written to the cache.
enum Aggregation {
    Cached(Vec<PlaceSummary>),
    Fresh(Vec<PlaceSummary>),
    /// The region is the unknown sentinel; there is nothing to search for.
    Skipped,
    Degraded(UpstreamError),
}

/// Builds the list of top attractions for a region.
#[derive(Clone)]
pub struct PlaceAggregator {
    directory: Arc<dyn PlacesDirectory>,
    cache: Arc<PlacesCache>,
    settings: PlacesSettings,
}

impl PlaceAggregator {
    pub fn new(
        directory: Arc<dyn PlacesDirectory>,
        cache: Arc<PlacesCache>,
        settings: PlacesSettings,
    ) -> Self {
        Self {
            directory,
            cache,
            settings,
        }
    }

    /// Ranked, enriched attractions in `region`, at most `top_n` of them.
    ///
    /// Never fails: an upstream error during geocoding or the radius search yields an
    /// empty list that is logged and left uncached.
    pub async fn places_for_region(&self, region: &Region) -> Vec<PlaceSummary> {
        match self.aggregate(region).await {
            Aggregation::Cached(places) => {
                debug!(region = %region, count = places.len(), "Places served from cache");
                places
            }
            Aggregation::Fresh(places) => {
                info!(region = %region, count = places.len(), "Places aggregated");
                places
            }
            Aggregation::Skipped => {
                debug!("Region unknown; skipping place aggregation");
                Vec::new()
            }
            Aggregation::Degraded(error) => {
                warn!(
                    region = %region,
                    error = %error,
                    "Place aggregation failed; returning no places"
                );
                counter!(METRIC_LOOKUP_DEGRADED, "operation" => "places").increment(1);
                Vec::new()
            }
        }
    }

    async fn aggregate(&self, region: &Region) -> Aggregation {
        if region.is_unknown() {
            return Aggregation::Skipped;
        }
        if let Some(places) = self.cache.get(region.as_str()) {
            return Aggregation::Cached(places);
        }

        let centre = match self.directory.geocode(region.as_str()).await {
            Ok(Some(centre)) => centre,
            Ok(None) => {
                debug!(region = %region, "Region has no known centre");
                self.cache.set(region.as_str().to_string(), Vec::new());
                return Aggregation::Fresh(Vec::new());
            }
            Err(error) => return Aggregation::Degraded(error),
        };

        let query = RadiusQuery {
            center: centre,
            radius_meters: self.settings.region_radius_meters.get(),
            kinds: self.settings.kinds.clone(),
            min_rating: self.settings.min_rating,
            limit: self.settings.region_candidate_limit.get(),
        };
        let candidates = match self.directory.radius_search(&query).await {
            Ok(candidates) => candidates,
            Err(error) => return Aggregation::Degraded(error),
        };

        let ranked = rank_candidates(candidates, self.settings.top_n.get());
        let enriched = run_bounded(self.settings.enrichment_concurrency, ranked, |place| {
            self.enrich(place)
        })
        .await;

        let places: Vec<PlaceSummary> = enriched.into_iter().flatten().collect();
        self.cache.set(region.as_str().to_string(), places.clone());
        Aggregation::Fresh(places)
    }

    async fn enrich(&self, place: RankedPlace) -> Option<PlaceSummary> {
        let id = place.id.as_deref()?;
        match self.directory.details(id).await {
            Ok(details) => {
                let summary = PlaceSummary::merge(&place, details);
                if summary.is_none() {
                    debug!(place_id = id, "Place details incomplete; dropping place");
                }
                summary
            }
            Err(error) => {
                debug!(place_id = id, error = %error, "Place details unavailable");
                None
            }
        }
    }
}
