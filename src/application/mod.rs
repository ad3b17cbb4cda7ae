//! Application services: region resolution, place aggregation and search.

pub mod error;
pub mod fanout;
pub mod location;
pub mod place_info;
pub mod places;
pub mod region;
pub mod search;
pub mod upstream;
pub mod weather;

#[cfg(test)]
pub(crate) mod test_support;

pub(crate) const METRIC_LOOKUP_DEGRADED: &str = "tourguard_lookup_degraded_total";
