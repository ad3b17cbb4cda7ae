use crate::application::places::PlaceAggregator;
use crate::application::region::RegionResolver;
use crate::domain::geo::{Coordinates, Region};
use crate::domain::places::PlaceSummary;

/// What is known about the area around a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationInfo {
    pub region: Region,
    pub places: Vec<PlaceSummary>,
}

/// Coordinate → region → attractions.
#[derive(Clone)]
pub struct LocationService {
    resolver: RegionResolver,
    aggregator: PlaceAggregator,
}

impl LocationService {
    pub fn new(resolver: RegionResolver, aggregator: PlaceAggregator) -> Self {
        Self {
            resolver,
            aggregator,
        }
    }

    pub async fn location_info(&self, point: Coordinates) -> LocationInfo {
        let region = self.resolver.resolve_region(point).await;
        let places = self.aggregator.places_for_region(&region).await;
        LocationInfo { region, places }
    }
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroUsize, sync::Arc, time::Duration};

    use super::*;
    use crate::application::test_support::{
        RegionAnswer, StubDirectory, StubGeocoder, candidate, named_details,
    };
    use crate::cache::TtlCache;
    use crate::config::PlacesSettings;

    fn service(geocoder: Arc<StubGeocoder>, directory: Arc<StubDirectory>) -> LocationService {
        let ttl = Duration::from_secs(86_400);
        let capacity = NonZeroUsize::new(8).expect("capacity");
        LocationService::new(
            RegionResolver::new(
                geocoder,
                Arc::new(TtlCache::new("regions", ttl, capacity)),
                Duration::from_secs(6),
            ),
            PlaceAggregator::new(
                directory,
                Arc::new(TtlCache::new("places", ttl, capacity)),
                PlacesSettings::default(),
            ),
        )
    }

    #[tokio::test]
    async fn chains_region_and_places() {
        let directory = StubDirectory::default()
            .with_centre("Goa", Coordinates::new(15.3, 74.0))
            .with_candidates(vec![candidate("x", "Fort Aguada", 5.0)])
            .with_details("x", named_details("Fort Aguada"));
        let service = service(
            Arc::new(StubGeocoder::new(RegionAnswer::Region("Goa"))),
            Arc::new(directory),
        );

        let info = service.location_info(Coordinates::new(15.5, 73.8)).await;

        assert_eq!(info.region.as_str(), "Goa");
        assert_eq!(info.places.len(), 1);
        assert_eq!(info.places[0].name, "Fort Aguada");
    }

    #[tokio::test]
    async fn unknown_region_has_no_places() {
        let directory = Arc::new(StubDirectory::default());
        let service = service(
            Arc::new(StubGeocoder::new(RegionAnswer::Fails)),
            Arc::clone(&directory),
        );

        let info = service.location_info(Coordinates::new(0.0, 0.0)).await;

        assert!(info.region.is_unknown());
        assert!(info.places.is_empty());
        assert_eq!(StubDirectory::count(&directory.geocode_calls), 0);
    }
}
