//! Discount filter.
//!
//! Each item is checked against a fixed sequence of predicates; the first one
//! that fails decides the [`Rejection`] reason. Survivors are annotated with
//! their discount and ordered best-first.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::models::{DiscountedItem, FilterConfig, Item, Snapshot};

/// Prefix glyph upstream puts on every knife *and* every pair of gloves.
pub const KNIFE_MARKER: char = '★';
/// Name fragments that identify gloves among starred items.
pub const GLOVE_MARKERS: &[&str] = &["Gloves", "Hand Wraps"];
pub const STATTRAK_MARKER: &str = "StatTrak";

/// Why an item was left out of a filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    NoListings,
    NoReferencePrice,
    StatTrak,
    NotKnife,
    NotGlove,
    PriceOutOfRange,
    BelowMinDiscount,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::NoListings => "no active listings",
            Rejection::NoReferencePrice => "missing or non-positive price",
            Rejection::StatTrak => "StatTrak excluded",
            Rejection::NotKnife => "not a knife",
            Rejection::NotGlove => "not gloves",
            Rejection::PriceOutOfRange => "price out of range",
            Rejection::BelowMinDiscount => "discount below minimum",
        };
        f.write_str(s)
    }
}

/// `(suggested - min) / suggested * 100`, rounded to two decimals.
///
/// `None` unless both prices are strictly positive.
pub fn discount_percent(suggested_price: f64, min_price: f64) -> Option<f64> {
    if !(suggested_price > 0.0 && min_price > 0.0) {
        return None;
    }
    let raw = (suggested_price - min_price) / suggested_price * 100.0;
    Some((raw * 100.0).round() / 100.0)
}

pub fn is_knife(name: &str) -> bool {
    name.contains(KNIFE_MARKER) && !is_glove(name)
}

pub fn is_glove(name: &str) -> bool {
    GLOVE_MARKERS.iter().any(|m| name.contains(m))
}

/// Run every predicate against one item.
///
/// Returns the item's discount on success. Does not validate `config`.
pub fn evaluate(item: &Item, config: &FilterConfig) -> std::result::Result<f64, Rejection> {
    if item.quantity.unwrap_or(0) == 0 {
        return Err(Rejection::NoListings);
    }

    let (suggested, min) = match (item.suggested_price, item.min_price) {
        (Some(s), Some(m)) if s > 0.0 && m > 0.0 => (s, m),
        _ => return Err(Rejection::NoReferencePrice),
    };

    if config.exclude_stattrak && item.name.contains(STATTRAK_MARKER) {
        return Err(Rejection::StatTrak);
    }
    if config.knife_only && !is_knife(&item.name) {
        return Err(Rejection::NotKnife);
    }
    // Gloves carry the star too, so both markers are required.
    if config.glove_only && !(item.name.contains(KNIFE_MARKER) && is_glove(&item.name)) {
        return Err(Rejection::NotGlove);
    }
    if min < config.min_price || min > config.max_price {
        return Err(Rejection::PriceOutOfRange);
    }

    let discount = discount_percent(suggested, min).ok_or(Rejection::NoReferencePrice)?;
    if discount < config.min_discount_percent {
        return Err(Rejection::BelowMinDiscount);
    }
    Ok(discount)
}

/// Filter a snapshot and sort the survivors by descending discount.
///
/// Ties keep their snapshot order. Fails with
/// [`SkinportError::Validation`](crate::SkinportError::Validation) if
/// `config` is unusable.
pub fn filter(snapshot: &Snapshot, config: &FilterConfig) -> Result<Vec<DiscountedItem>> {
    filter_items(&snapshot.items, config)
}

/// Same as [`filter`], over a bare slice of items.
pub fn filter_items(items: &[Item], config: &FilterConfig) -> Result<Vec<DiscountedItem>> {
    config.validate()?;

    let mut rejected: BTreeMap<Rejection, usize> = BTreeMap::new();
    let mut kept = Vec::new();
    for item in items {
        match evaluate(item, config) {
            Ok(discount_percent) => kept.push(DiscountedItem {
                item: item.clone(),
                discount_percent,
            }),
            Err(reason) => *rejected.entry(reason).or_default() += 1,
        }
    }

    // sort_by is stable
    kept.sort_by(|a, b| b.discount_percent.total_cmp(&a.discount_percent));

    tracing::debug!(
        total = items.len(),
        kept = kept.len(),
        rejected = ?rejected,
        "filtered snapshot"
    );
    Ok(kept)
}
