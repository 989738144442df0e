use crate::models::{AggregateSnapshot, BedroomBucket};
use serde::Serialize;
use std::collections::BTreeMap;

/// Labels a user can pick from, taken from the loaded snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub property_types: Vec<String>,
    pub locations: Vec<String>,
    /// Ascending, so the first and last entries bound the date pickers
    pub months: Vec<String>,
}

impl FilterOptions {
    pub fn from_snapshot(snapshot: &AggregateSnapshot) -> Self {
        let analytics = &snapshot.analytics;
        Self {
            property_types: analytics.avg_price_by_type.keys().cloned().collect(),
            locations: analytics.avg_price_by_location.keys().cloned().collect(),
            months: analytics.listings_by_month.keys().cloned().collect(),
        }
    }
}

/// `(label, average price)` pairs in label order
pub fn price_series(prices: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    prices.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// `(month, listings)` pairs in chronological order
pub fn monthly_series(months: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    months.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// One slice of the bedroom distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BedroomShare {
    pub bucket: BedroomBucket,
    pub count: u64,
    /// Share of the filtered total, rounded to a whole percent
    pub percent: u64,
}

pub fn bedroom_shares(distribution: &BTreeMap<BedroomBucket, u64>) -> Vec<BedroomShare> {
    let total: u64 = distribution.values().sum();

    distribution
        .iter()
        .map(|(bucket, count)| BedroomShare {
            bucket: *bucket,
            count: *count,
            percent: if total == 0 {
                0
            } else {
                (*count as f64 / total as f64 * 100.0).round() as u64
            },
        })
        .collect()
}
