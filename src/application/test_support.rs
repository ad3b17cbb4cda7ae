//! In-memory upstream doubles for service tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::application::upstream::{
    PlacesDirectory, RadiusQuery, ReverseGeocoder, UpstreamError,
};
use crate::domain::geo::Coordinates;
use crate::domain::places::{Candidate, PlaceDetails};

#[derive(Debug, Clone)]
pub(crate) enum RegionAnswer {
    Region(&'static str),
    Missing,
    Fails,
    Hangs,
}

pub(crate) struct StubGeocoder {
    answer: Mutex<RegionAnswer>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub(crate) fn new(answer: RegionAnswer) -> Self {
        Self {
            answer: Mutex::new(answer),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn answer_with(&self, answer: RegionAnswer) {
        *self.answer.lock().expect("answer lock") = answer;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for StubGeocoder {
    async fn region_for(&self, _point: Coordinates) -> Result<Option<String>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.lock().expect("answer lock").clone();
        match answer {
            RegionAnswer::Region(name) => Ok(Some(name.to_string())),
            RegionAnswer::Missing => Ok(None),
            RegionAnswer::Fails => Err(UpstreamError::Status { status: 503 }),
            RegionAnswer::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct StubDirectory {
    pub(crate) centres: Mutex<HashMap<String, Coordinates>>,
    pub(crate) geocode_fails: AtomicBool,
    pub(crate) candidates: Mutex<Vec<Candidate>>,
    pub(crate) radius_fails: AtomicBool,
    pub(crate) details: Mutex<HashMap<String, PlaceDetails>>,
    pub(crate) suggestion: Mutex<Option<Candidate>>,
    pub(crate) last_query: Mutex<Option<RadiusQuery>>,
    pub(crate) geocode_calls: AtomicUsize,
    pub(crate) radius_calls: AtomicUsize,
    pub(crate) details_calls: AtomicUsize,
}

impl StubDirectory {
    pub(crate) fn with_centre(self, name: &str, centre: Coordinates) -> Self {
        self.centres
            .lock()
            .expect("centres lock")
            .insert(name.to_string(), centre);
        self
    }

    pub(crate) fn with_candidates(self, candidates: Vec<Candidate>) -> Self {
        *self.candidates.lock().expect("candidates lock") = candidates;
        self
    }

    pub(crate) fn with_details(self, id: &str, details: PlaceDetails) -> Self {
        self.details
            .lock()
            .expect("details lock")
            .insert(id.to_string(), details);
        self
    }

    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlacesDirectory for StubDirectory {
    async fn geocode(&self, name: &str) -> Result<Option<Coordinates>, UpstreamError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        if self.geocode_fails.load(Ordering::SeqCst) {
            return Err(UpstreamError::Transport("connection refused".to_string()));
        }
        Ok(self.centres.lock().expect("centres lock").get(name).copied())
    }

    async fn radius_search(&self, query: &RadiusQuery) -> Result<Vec<Candidate>, UpstreamError> {
        self.radius_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().expect("query lock") = Some(query.clone());
        if self.radius_fails.load(Ordering::SeqCst) {
            return Err(UpstreamError::Status { status: 500 });
        }
        Ok(self.candidates.lock().expect("candidates lock").clone())
    }

    async fn details(&self, id: &str) -> Result<PlaceDetails, UpstreamError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .expect("details lock")
            .get(id)
            .cloned()
            .ok_or(UpstreamError::Status { status: 404 })
    }

    async fn autosuggest(&self, _name: &str) -> Result<Option<Candidate>, UpstreamError> {
        Ok(self.suggestion.lock().expect("suggestion lock").clone())
    }
}

pub(crate) fn candidate(id: &str, name: &str, rating: f64) -> Candidate {
    Candidate {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        rating: Some(rating),
        kinds: Some("museums".to_string()),
        distance: Some(1200.0),
        point: Some(Coordinates::new(10.0, 20.0)),
    }
}

pub(crate) fn named_details(name: &str) -> PlaceDetails {
    PlaceDetails {
        name: Some(name.to_string()),
        point: Some(Coordinates::new(11.0, 21.0)),
        extract: Some(format!("About {name}")),
        ..Default::default()
    }
}
