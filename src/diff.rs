//! Change detection between two filtered result sets.

use std::collections::HashMap;

use crate::models::DiscountedItem;

/// How an item in the current set is matched against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffStrategy {
    /// Repeated only if the baseline holds a field-for-field equal item.
    /// Any price drift makes a known item "new" again.
    #[default]
    Structural,
    /// Repeated if the baseline holds an item with the same name.
    ByName,
}

/// An item present in both sets (by name) whose lowest price changed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMove {
    pub name: String,
    pub previous_min_price: Option<f64>,
    pub current_min_price: Option<f64>,
}

impl PriceMove {
    /// `current - previous`, when both are known.
    pub fn delta(&self) -> Option<f64> {
        Some(self.current_min_price? - self.previous_min_price?)
    }
}

/// Classification of a filtered set against the previous baseline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    pub new_items: Vec<DiscountedItem>,
    pub repeated_items: Vec<DiscountedItem>,
    /// Informational only; independent of the strategy used.
    pub price_moves: Vec<PriceMove>,
}

impl ChangeSet {
    /// True when the current set was empty.
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty() && self.repeated_items.is_empty()
    }

    pub fn has_new(&self) -> bool {
        !self.new_items.is_empty()
    }
}

/// Diff with [`DiffStrategy::Structural`].
pub fn diff(current: &[DiscountedItem], previous: &[DiscountedItem]) -> ChangeSet {
    diff_with(current, previous, DiffStrategy::Structural)
}

/// Split `current` into items new since `previous` and items already seen.
///
/// Both output lists keep the order of `current`.
pub fn diff_with(
    current: &[DiscountedItem],
    previous: &[DiscountedItem],
    strategy: DiffStrategy,
) -> ChangeSet {
    let mut by_name: HashMap<&str, Vec<&DiscountedItem>> = HashMap::new();
    for item in previous {
        by_name.entry(item.name()).or_default().push(item);
    }

    let mut changes = ChangeSet::default();
    for item in current {
        let same_name = by_name.get(item.name());

        let seen = match (strategy, same_name) {
            (_, None) => false,
            (DiffStrategy::ByName, Some(_)) => true,
            (DiffStrategy::Structural, Some(candidates)) => candidates.iter().any(|p| *p == item),
        };

        if let Some(first) = same_name.and_then(|c| c.first()) {
            if first.item.min_price != item.item.min_price {
                changes.price_moves.push(PriceMove {
                    name: item.name().to_string(),
                    previous_min_price: first.item.min_price,
                    current_min_price: item.item.min_price,
                });
            }
        }

        if seen {
            changes.repeated_items.push(item.clone());
        } else {
            changes.new_items.push(item.clone());
        }
    }

    tracing::debug!(
        ?strategy,
        new = changes.new_items.len(),
        repeated = changes.repeated_items.len(),
        price_moves = changes.price_moves.len(),
        "diffed against baseline"
    );
    changes
}
