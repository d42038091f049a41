use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Item: One marketplace listing as reported by /v1/items
// ---------------------------------------------------------------------------

/// A single Skinport listing summary.
///
/// Every price is optional: upstream omits fields (or sends `null`) for items
/// without sales data, and "no price" must stay distinguishable from a price
/// of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "market_hash_name")]
    pub name: String,
    pub currency: Option<String>,
    pub suggested_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub mean_price: Option<f64>,
    pub median_price: Option<f64>,
    pub quantity: Option<u64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(rename = "item_page")]
    pub link: Option<String>,
}

impl Item {
    /// Normalize one raw upstream JSON object.
    ///
    /// Returns `None` when `value` is not an object or has no string
    /// `market_hash_name`. Numeric fields holding anything but a JSON number
    /// are treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = obj.get("market_hash_name")?.as_str()?.to_string();

        Some(Self {
            name,
            currency: string_field(obj, "currency"),
            suggested_price: number_field(obj, "suggested_price"),
            min_price: number_field(obj, "min_price"),
            max_price: number_field(obj, "max_price"),
            mean_price: number_field(obj, "mean_price"),
            median_price: number_field(obj, "median_price"),
            quantity: obj.get("quantity").and_then(Value::as_u64),
            created_at: obj.get("created_at").and_then(Value::as_i64),
            updated_at: obj.get("updated_at").and_then(Value::as_i64),
            link: string_field(obj, "item_page").or_else(|| string_field(obj, "market_page")),
        })
    }

    /// Discount of the lowest listing against the suggested price, in percent.
    ///
    /// `None` unless both prices are present and strictly positive.
    pub fn discount_percent(&self) -> Option<f64> {
        crate::filter::discount_percent(self.suggested_price?, self.min_price?)
    }
}

// ---------------------------------------------------------------------------
// DiscountedItem: Item annotated with its computed discount
// ---------------------------------------------------------------------------

/// An [`Item`] that passed the filter, together with its discount.
///
/// Serialized flat, i.e. the upstream fields plus a `discount_percent` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedItem {
    #[serde(flatten)]
    pub item: Item,
    pub discount_percent: f64,
}

impl DiscountedItem {
    pub fn name(&self) -> &str {
        &self.item.name
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Format an amount with the symbol of its currency, e.g. `€12.50`.
///
/// Unknown codes are printed as a prefix (`PLN12.50`).
pub fn format_price(amount: f64, currency: &str) -> String {
    let symbol = match currency {
        "EUR" => "€",
        "USD" => "$",
        "GBP" => "£",
        other => other,
    };
    format!("{symbol}{amount:.2}")
}
