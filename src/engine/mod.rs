//! Filter state and derivation.
//!
//! Everything here is pure: a filtered view is a function of one snapshot
//! and one criteria value, recomputed in full after every change.

pub mod chart;
pub mod criteria;

pub use chart::{bedroom_shares, monthly_series, price_series, BedroomShare, FilterOptions};
pub use criteria::{CriterionUpdate, FilterCriteria, Range, Selection, MAX_MIN_BEDROOMS};

use crate::models::{AggregateSnapshot, Aggregates};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The four aggregate mappings restricted to entries passing the criteria
pub type FilteredView = Aggregates;

/// Margin applied below the cheapest type average for the default price window
const DEFAULT_PRICE_FLOOR_FACTOR: f64 = 0.8;
/// Margin applied above the most expensive type average
const DEFAULT_PRICE_CEIL_FACTOR: f64 = 1.2;

/// Criteria that exclude nothing from the given snapshot
pub fn initialize_defaults(snapshot: &AggregateSnapshot) -> FilterCriteria {
    let analytics = &snapshot.analytics;

    let prices = analytics.avg_price_by_type.values().copied();
    let price_range = match min_max(prices) {
        Some((low, high)) => Range::new(
            (low * DEFAULT_PRICE_FLOOR_FACTOR).floor(),
            (high * DEFAULT_PRICE_CEIL_FACTOR).ceil(),
        ),
        None => Range::new(0.0, 0.0),
    };

    // BTreeMap keys are already in lexicographic order
    let months = &analytics.listings_by_month;
    let date_range = match (months.keys().next(), months.keys().next_back()) {
        (Some(first), Some(last)) => Range::new(first.clone(), last.clone()),
        _ => Range::new(String::new(), String::new()),
    };

    FilterCriteria {
        price_range,
        property_types: Selection::all(),
        locations: Selection::all(),
        date_range,
        min_bedrooms: 0,
    }
}

/// Discard all user selections; identical to `initialize_defaults`
pub fn reset(snapshot: &AggregateSnapshot) -> FilterCriteria {
    initialize_defaults(snapshot)
}

/// Derive the filtered view. Never fails; a filter matching nothing yields
/// empty mappings.
///
/// Each mapping is filtered only by the criteria meaningful to it: price and
/// type/location for the price mappings, the date range for monthly counts,
/// and the bedroom minimum for the bedroom distribution.
pub fn apply(snapshot: &AggregateSnapshot, criteria: &FilterCriteria) -> FilteredView {
    let analytics = &snapshot.analytics;

    let view = FilteredView {
        avg_price_by_type: filter_prices(
            &analytics.avg_price_by_type,
            &criteria.property_types,
            &criteria.price_range,
        ),
        avg_price_by_location: filter_prices(
            &analytics.avg_price_by_location,
            &criteria.locations,
            &criteria.price_range,
        ),
        listings_by_month: analytics
            .listings_by_month
            .iter()
            .filter(|(month, _)| criteria.date_range.contains_key(month))
            .map(|(month, count)| (month.clone(), *count))
            .collect(),
        bedroom_distribution: analytics
            .bedroom_distribution
            .iter()
            .filter(|(bucket, _)| bucket.satisfies(criteria.min_bedrooms))
            .map(|(bucket, count)| (*bucket, *count))
            .collect(),
    };

    debug!(
        "Derived view for task {}: {} types, {} locations, {} months, {} bedroom buckets",
        snapshot.task_id,
        view.avg_price_by_type.len(),
        view.avg_price_by_location.len(),
        view.listings_by_month.len(),
        view.bedroom_distribution.len()
    );

    view
}

/// Return criteria with one field changed.
///
/// Setting one bound leaves the other untouched, even if that inverts the
/// range. Non-finite prices are ignored and `min_bedrooms` is clamped to 0..=5.
pub fn set_criterion(criteria: &FilterCriteria, update: CriterionUpdate) -> FilterCriteria {
    let mut next = criteria.clone();

    match update {
        CriterionUpdate::MinPrice(value) | CriterionUpdate::MaxPrice(value) if !value.is_finite() => {
            warn!("Ignoring non-finite price bound {}", value);
        }
        CriterionUpdate::MinPrice(value) => next.price_range.min = value,
        CriterionUpdate::MaxPrice(value) => next.price_range.max = value,
        CriterionUpdate::StartMonth(month) => next.date_range.min = month,
        CriterionUpdate::EndMonth(month) => next.date_range.max = month,
        CriterionUpdate::TogglePropertyType(label) => {
            next.property_types = criteria.property_types.toggled(&label);
        }
        CriterionUpdate::ToggleLocation(label) => {
            next.locations = criteria.locations.toggled(&label);
        }
        CriterionUpdate::MinBedrooms(value) => {
            if value > MAX_MIN_BEDROOMS {
                warn!("Clamping min bedrooms {} to {}", value, MAX_MIN_BEDROOMS);
            }
            next.min_bedrooms = value.min(MAX_MIN_BEDROOMS);
        }
    }

    next
}

fn filter_prices(
    prices: &BTreeMap<String, f64>,
    selection: &Selection,
    range: &Range<f64>,
) -> BTreeMap<String, f64> {
    prices
        .iter()
        .filter(|(label, price)| selection.admits(label) && range.contains(price))
        .map(|(label, price)| (label.clone(), *price))
        .collect()
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((low, high)) => Some((low.min(v), high.max(v))),
    })
}
