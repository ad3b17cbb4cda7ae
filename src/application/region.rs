use std::{sync::Arc, time::Duration};

use metrics::counter;
use tracing::{debug, warn};

use crate::application::METRIC_LOOKUP_DEGRADED;
use crate::application::upstream::{ReverseGeocoder, UpstreamError};
use crate::cache::{RegionCache, coordinate_key};
use crate::domain::geo::{Coordinates, Region};

enum RegionLookup {
    Cached(Region),
    Resolved(Region),
    Degraded(UpstreamError),
}

/// Maps coordinates to the administrative region containing them.
#[derive(Clone)]
pub struct RegionResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
    cache: Arc<RegionCache>,
    timeout: Duration,
}

impl RegionResolver {
    pub fn new(
        geocoder: Arc<dyn ReverseGeocoder>,
        cache: Arc<RegionCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            geocoder,
            cache,
            timeout,
        }
    }

    /// Resolve the region for `point`. Never fails: any upstream problem yields
    /// [`Region::unknown`], which is not cached so the next request retries.
    pub async fn resolve_region(&self, point: Coordinates) -> Region {
        match self.lookup(point).await {
            RegionLookup::Cached(region) => {
                debug!(region = %region, "Region served from cache");
                region
            }
            RegionLookup::Resolved(region) => {
                debug!(region = %region, "Region resolved upstream");
                region
            }
            RegionLookup::Degraded(error) => {
                warn!(
                    lat = point.lat,
                    lon = point.lon,
                    error = %error,
                    "Reverse geocoding failed; falling back to unknown region"
                );
                counter!(METRIC_LOOKUP_DEGRADED, "operation" => "region").increment(1);
                Region::unknown()
            }
        }
    }

    async fn lookup(&self, point: Coordinates) -> RegionLookup {
        let key = coordinate_key(point);
        if let Some(region) = self.cache.get(&key) {
            return RegionLookup::Cached(region);
        }

        let name = match tokio::time::timeout(self.timeout, self.geocoder.region_for(point)).await
        {
            Err(_) => return RegionLookup::Degraded(UpstreamError::Timeout(self.timeout)),
            Ok(Err(error)) => return RegionLookup::Degraded(error),
            Ok(Ok(name)) => name,
        };

        let region = match name.map(|name| name.trim().to_string()) {
            Some(name) if !name.is_empty() => Region::new(name),
            _ => {
                return RegionLookup::Degraded(UpstreamError::malformed(
                    "response carried no region",
                ));
            }
        };

        if !region.is_unknown() {
            self.cache.set(key, region.clone());
        }
        RegionLookup::Resolved(region)
    }
}
