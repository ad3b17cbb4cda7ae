//! In-process caches for upstream lookups.
//!
//! Three independent stores sit in front of the third-party services:
//!
//! - **regions**: rounded coordinates → administrative region name
//! - **places**: region name → enriched top attractions
//! - **searches**: normalised place name → search result
//!
//! All of them expire entries after the configured TTL and evict least-recently-used
//! entries once their capacity is reached. Nothing is persisted across restarts.

mod keys;
mod lock;
mod store;

use std::sync::Arc;

pub use keys::{coordinate_key, search_key};
pub use store::TtlCache;

use crate::config::CacheSettings;
use crate::domain::geo::Region;
use crate::domain::places::{PlaceSummary, SearchResult};

pub type RegionCache = TtlCache<String, Region>;
pub type PlacesCache = TtlCache<String, Vec<PlaceSummary>>;
pub type SearchCache = TtlCache<String, SearchResult>;

/// The cache instances owned by one running service.
#[derive(Clone)]
pub struct LocationCaches {
    pub regions: Arc<RegionCache>,
    pub places: Arc<PlacesCache>,
    pub searches: Arc<SearchCache>,
}

impl LocationCaches {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            regions: Arc::new(TtlCache::new(
                "regions",
                settings.ttl,
                settings.region_capacity,
            )),
            places: Arc::new(TtlCache::new(
                "places",
                settings.ttl,
                settings.places_capacity,
            )),
            searches: Arc::new(TtlCache::new(
                "searches",
                settings.ttl,
                settings.search_capacity,
            )),
        }
    }
}
