use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::upstream::{PlacesDirectory, UpstreamError};
use crate::domain::places::PlaceInfo;

#[derive(Debug, Error)]
pub enum PlaceInfoError {
    #[error("no place matches `{0}`")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Looks up the best match for a place name and returns its full record.
#[derive(Clone)]
pub struct PlaceInfoService {
    directory: Arc<dyn PlacesDirectory>,
}

impl PlaceInfoService {
    pub fn new(directory: Arc<dyn PlacesDirectory>) -> Self {
        Self { directory }
    }

    pub async fn place_info(&self, name: &str) -> Result<PlaceInfo, PlaceInfoError> {
        let name = name.trim();
        let not_found = || PlaceInfoError::NotFound(name.to_string());

        let hit = self.directory.autosuggest(name).await?.ok_or_else(not_found)?;
        let id = hit
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(not_found)?;

        debug!(query = name, place_id = %id, "Fetching details for best match");
        let details = self.directory.details(&id).await?;
        Ok(PlaceInfo::from_parts(&hit, id, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{StubDirectory, candidate};
    use crate::domain::geo::Coordinates;
    use crate::domain::places::PlaceDetails;

    #[tokio::test]
    async fn merges_suggestion_with_details() {
        let directory = StubDirectory::default().with_details(
            "W42",
            PlaceDetails {
                name: Some("Mysore Palace".to_string()),
                point: Some(Coordinates::new(12.3, 76.65)),
                info_description: Some("Royal residence".to_string()),
                images: vec!["https://img/a.jpg".to_string()],
                ..Default::default()
            },
        );
        *directory.suggestion.lock().expect("suggestion lock") =
            Some(candidate("W42", "Mysore", 7.0));
        let service = PlaceInfoService::new(Arc::new(directory));

        let info = service.place_info("mysore palace").await.expect("place info");

        assert_eq!(info.id, "W42");
        assert_eq!(info.name, "Mysore Palace");
        assert_eq!(info.description, "Royal residence");
        assert_eq!(info.point, Some(Coordinates::new(12.3, 76.65)));
        assert_eq!(info.photos, vec!["https://img/a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn falls_back_to_suggested_name() {
        let directory = StubDirectory::default().with_details("N1", PlaceDetails::default());
        *directory.suggestion.lock().expect("suggestion lock") =
            Some(candidate("N1", "Hampi", 6.0));
        let service = PlaceInfoService::new(Arc::new(directory));

        let info = service.place_info("hampi").await.expect("place info");

        assert_eq!(info.name, "Hampi");
        assert_eq!(info.description, "");
        assert!(info.point.is_none());
    }

    #[tokio::test]
    async fn no_suggestion_is_not_found() {
        let service = PlaceInfoService::new(Arc::new(StubDirectory::default()));

        let err = service.place_info("nowhere").await.expect_err("no match");
        assert!(matches!(err, PlaceInfoError::NotFound(name) if name == "nowhere"));
    }

    #[tokio::test]
    async fn details_failure_is_an_upstream_error() {
        let directory = StubDirectory::default();
        *directory.suggestion.lock().expect("suggestion lock") =
            Some(candidate("missing", "Ghost", 3.0));
        let service = PlaceInfoService::new(Arc::new(directory));

        let err = service.place_info("ghost").await.expect_err("details fail");
        assert!(matches!(
            err,
            PlaceInfoError::Upstream(UpstreamError::Status { status: 404 })
        ));
    }
}
