use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::METRIC_LOOKUP_DEGRADED;
use crate::application::upstream::{PlacesDirectory, RadiusQuery};
use crate::cache::{SearchCache, search_key};
use crate::config::PlacesSettings;
use crate::domain::places::{SearchResult, rank_candidates};

/// Outcome of a name search. Only `Found` results are ever cached.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceSearchOutcome {
    Found(SearchResult),
    NotFound,
    /// An upstream call failed; the caller should try again later.
    Unavailable,
}

/// Free-text place lookup with nearby attractions.
#[derive(Clone)]
pub struct PlaceSearch {
    directory: Arc<dyn PlacesDirectory>,
    cache: Arc<SearchCache>,
    settings: PlacesSettings,
}

impl PlaceSearch {
    pub fn new(
        directory: Arc<dyn PlacesDirectory>,
        cache: Arc<SearchCache>,
        settings: PlacesSettings,
    ) -> Self {
        Self {
            directory,
            cache,
            settings,
        }
    }

    pub async fn search_by_name(&self, name: &str) -> PlaceSearchOutcome {
        let key = search_key(name);
        if key.is_empty() {
            return PlaceSearchOutcome::NotFound;
        }
        if let Some(result) = self.cache.get(&key) {
            debug!(query = %key, "Search served from cache");
            return PlaceSearchOutcome::Found(result);
        }

        let query_name = name.trim();
        let centre = match self.directory.geocode(query_name).await {
            Ok(Some(centre)) => centre,
            Ok(None) => {
                info!(query = %key, "No place matches search");
                return PlaceSearchOutcome::NotFound;
            }
            Err(error) => {
                warn!(query = %key, error = %error, "Place geocoding failed");
                counter!(METRIC_LOOKUP_DEGRADED, "operation" => "search").increment(1);
                return PlaceSearchOutcome::Unavailable;
            }
        };

        let query = RadiusQuery {
            center: centre,
            radius_meters: self.settings.search_radius_meters.get(),
            kinds: self.settings.kinds.clone(),
            min_rating: self.settings.min_rating,
            limit: self.settings.search_candidate_limit.get(),
        };
        let candidates = match self.directory.radius_search(&query).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(query = %key, error = %error, "Nearby attraction search failed");
                counter!(METRIC_LOOKUP_DEGRADED, "operation" => "search").increment(1);
                return PlaceSearchOutcome::Unavailable;
            }
        };

        let result = SearchResult {
            query_name: query_name.to_string(),
            center: centre,
            attractions: rank_candidates(candidates, self.settings.top_n.get()),
        };
        self.cache.set(key, result.clone());
        PlaceSearchOutcome::Found(result)
    }
}
