//! Points of interest: raw search candidates, ranking and enriched summaries.

use std::collections::HashSet;

use super::geo::Coordinates;

/// A radius-search hit as returned by the places directory. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub id: Option<String>,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub kinds: Option<String>,
    pub distance: Option<f64>,
    pub point: Option<Coordinates>,
}

/// A candidate that survived filtering: it has a name and a non-zero rating.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlace {
    pub id: Option<String>,
    pub name: String,
    pub rating: f64,
    pub kinds: Option<String>,
    pub distance: Option<f64>,
    pub point: Option<Coordinates>,
}

impl RankedPlace {
    fn from_candidate(candidate: Candidate) -> Option<Self> {
        let name = candidate.name.filter(|name| !name.trim().is_empty())?;
        let rating = candidate
            .rating
            .filter(|rating| rating.is_finite() && *rating != 0.0)?;

        Some(Self {
            id: candidate.id.filter(|id| !id.is_empty()),
            name,
            rating,
            kinds: candidate.kinds,
            distance: candidate.distance,
            point: candidate.point,
        })
    }
}

/// Keep named, rated candidates, sort them by rating (highest first) and keep `limit`.
///
/// The sort is stable, so equally rated places keep the upstream order. A repeated id
/// keeps only its first occurrence.
pub fn rank_candidates(candidates: Vec<Candidate>, limit: usize) -> Vec<RankedPlace> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<RankedPlace> = candidates
        .into_iter()
        .filter_map(RankedPlace::from_candidate)
        .filter(|place| match place.id.as_ref() {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect();

    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked.truncate(limit);
    ranked
}

/// Full record for one place from the details endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDetails {
    pub id: Option<String>,
    pub name: Option<String>,
    pub point: Option<Coordinates>,
    pub preview_url: Option<String>,
    pub extract: Option<String>,
    pub info_description: Option<String>,
    pub images: Vec<String>,
}

impl PlaceDetails {
    /// Wikipedia extract first, then the directory's own description.
    pub fn description(&self) -> String {
        self.extract
            .as_deref()
            .filter(|text| !text.is_empty())
            .or_else(|| {
                self.info_description
                    .as_deref()
                    .filter(|text| !text.is_empty())
            })
            .unwrap_or_default()
            .to_string()
    }

    fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }
}

/// An enriched attraction. Built once per aggregation and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSummary {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub image_url: Option<String>,
    pub description: String,
}

impl PlaceSummary {
    /// Merge a ranked candidate with its details. Returns `None` when the candidate has
    /// no id, the details carry no name, or neither side knows where the place is.
    pub fn merge(place: &RankedPlace, details: PlaceDetails) -> Option<Self> {
        let id = place.id.clone()?;
        let name = details.display_name()?.to_string();
        let point = details.point.or(place.point)?;
        let description = details.description();

        Some(Self {
            id,
            name,
            lat: point.lat,
            lon: point.lon,
            image_url: details.preview_url.filter(|url| !url.is_empty()),
            description,
        })
    }
}

/// Result of a free-text place search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub query_name: String,
    pub center: Coordinates,
    pub attractions: Vec<RankedPlace>,
}

/// Detailed view of a single place found by name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceInfo {
    pub id: String,
    pub name: String,
    pub point: Option<Coordinates>,
    pub description: String,
    pub image_url: Option<String>,
    pub photos: Vec<String>,
}

impl PlaceInfo {
    /// Combine the autosuggest hit with its details; the details win where both are set.
    pub fn from_parts(hit: &Candidate, id: String, details: PlaceDetails) -> Self {
        let name = details
            .display_name()
            .map(str::to_string)
            .or_else(|| hit.name.clone())
            .unwrap_or_default();
        let description = details.description();

        Self {
            id: details.id.clone().filter(|value| !value.is_empty()).unwrap_or(id),
            name,
            point: details.point,
            description,
            image_url: details.preview_url,
            photos: details.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: Option<&str>, rating: Option<f64>) -> Candidate {
        Candidate {
            id: Some(id.to_string()),
            name: name.map(str::to_string),
            rating,
            point: Some(Coordinates::new(10.0, 20.0)),
            ..Default::default()
        }
    }

    #[test]
    fn ranks_by_rating_descending_and_keeps_ties_stable() {
        let ranked = rank_candidates(
            vec![
                candidate("a", Some("A"), Some(3.0)),
                candidate("b", Some("B"), Some(5.0)),
                candidate("c", Some("C"), Some(4.0)),
                candidate("d", Some("D"), Some(5.0)),
            ],
            10,
        );

        let ratings: Vec<f64> = ranked.iter().map(|place| place.rating).collect();
        let ids: Vec<&str> = ranked
            .iter()
            .filter_map(|place| place.id.as_deref())
            .collect();
        assert_eq!(ratings, vec![5.0, 5.0, 4.0, 3.0]);
        assert_eq!(ids, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn drops_candidates_without_name_or_rating() {
        let ranked = rank_candidates(
            vec![
                candidate("a", None, Some(7.0)),
                candidate("b", Some("B"), None),
                candidate("c", Some(""), Some(6.0)),
                candidate("d", Some("D"), Some(0.0)),
                candidate("e", Some("E"), Some(1.0)),
            ],
            10,
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "E");
    }

    #[test]
    fn truncates_to_limit() {
        let candidates = (0..25)
            .map(|i| candidate(&format!("p{i}"), Some("P"), Some(f64::from(i % 7 + 1))))
            .collect();

        let ranked = rank_candidates(candidates, 10);
        assert_eq!(ranked.len(), 10);
        assert!(ranked.windows(2).all(|pair| pair[0].rating >= pair[1].rating));
    }

    #[test]
    fn repeated_ids_keep_first_occurrence() {
        let ranked = rank_candidates(
            vec![
                candidate("a", Some("First"), Some(3.0)),
                candidate("a", Some("Second"), Some(7.0)),
            ],
            10,
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "First");
    }

    #[test]
    fn merge_prefers_detail_coordinates_and_falls_back() {
        let ranked = rank_candidates(vec![candidate("x", Some("Raw"), Some(3.0))], 1).remove(0);

        let precise = PlaceSummary::merge(
            &ranked,
            PlaceDetails {
                name: Some("Full Name".to_string()),
                point: Some(Coordinates::new(1.5, 2.5)),
                preview_url: Some("https://img/1.jpg".to_string()),
                extract: Some("About it".to_string()),
                ..Default::default()
            },
        )
        .expect("merged summary");
        assert_eq!(precise.name, "Full Name");
        assert_eq!((precise.lat, precise.lon), (1.5, 2.5));
        assert_eq!(precise.image_url.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(precise.description, "About it");

        let fallback = PlaceSummary::merge(
            &ranked,
            PlaceDetails {
                name: Some("Full Name".to_string()),
                ..Default::default()
            },
        )
        .expect("merged summary");
        assert_eq!((fallback.lat, fallback.lon), (10.0, 20.0));
        assert!(fallback.image_url.is_none());
        assert_eq!(fallback.description, "");
    }

    #[test]
    fn merge_requires_a_detail_name() {
        let ranked = rank_candidates(vec![candidate("x", Some("Raw"), Some(3.0))], 1).remove(0);
        assert!(PlaceSummary::merge(&ranked, PlaceDetails::default()).is_none());
    }

    #[test]
    fn description_falls_back_to_info() {
        let details = PlaceDetails {
            extract: Some(String::new()),
            info_description: Some("From info".to_string()),
            ..Default::default()
        };
        assert_eq!(details.description(), "From info");
    }
}
