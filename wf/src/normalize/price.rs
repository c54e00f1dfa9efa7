//! Price decoding for provider payloads

use serde::Deserialize;
use serde_json::Value;

use crate::domain::Money;
use crate::domain::lenient::value_to_string;
use crate::pattern::Pattern;

static PRICE_TEXT: Pattern = Pattern::new(r"([A-Z]{3}|\$|€|£)?\s*([0-9]+(?:\.[0-9]+)?)");

/// Price fields seen across the flights, hotels and events engines
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceFields {
    pub extracted_lowest: Option<Value>,
    pub extracted_price: Option<Value>,
    pub amount: Option<Value>,
    pub price: Option<Value>,
    pub lowest: Option<Value>,
    pub display: Option<Value>,
    pub currency: Option<Value>,
}

/// A price as a provider sent it
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Object(PriceFields),
    Number(f64),
    Text(String),
}

impl RawPrice {
    /// Currency stated by the provider, if any
    pub fn currency(&self) -> Option<String> {
        match self {
            RawPrice::Object(fields) => fields
                .currency
                .as_ref()
                .and_then(value_to_string)
                .filter(|c| !c.trim().is_empty()),
            RawPrice::Number(_) => None,
            RawPrice::Text(text) => parse_price_text(text, "").map(|m| m.currency).filter(|c| !c.is_empty()),
        }
    }

    /// Resolve to an amount, using `default_currency` when none is stated
    pub fn money(&self, default_currency: &str) -> Option<Money> {
        match self {
            RawPrice::Object(fields) => {
                let currency = self.currency().unwrap_or_else(|| default_currency.to_string());
                let numeric = [&fields.extracted_lowest, &fields.extracted_price, &fields.amount, &fields.price]
                    .into_iter()
                    .flatten()
                    .find_map(|v| match v {
                        Value::Number(n) => n.as_f64(),
                        _ => None,
                    });
                if let Some(amount) = numeric {
                    return Some(Money::new(amount, currency));
                }
                [&fields.price, &fields.amount, &fields.lowest, &fields.display]
                    .into_iter()
                    .flatten()
                    .filter_map(value_to_string)
                    .find_map(|text| parse_price_text(&text, &currency))
            }
            RawPrice::Number(n) => Some(Money::new(*n, default_currency)),
            RawPrice::Text(text) => parse_price_text(text, default_currency),
        }
    }

    /// Display text for the price
    pub fn text(&self) -> Option<String> {
        match self {
            RawPrice::Object(fields) => [&fields.lowest, &fields.display, &fields.price, &fields.amount]
                .into_iter()
                .flatten()
                .filter_map(value_to_string)
                .find(|s| !s.trim().is_empty()),
            RawPrice::Number(n) => Some(n.to_string()),
            RawPrice::Text(text) => Some(text.clone()).filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Decode a price value that may be absent or malformed
pub fn raw_price(value: Option<&Value>) -> Option<RawPrice> {
    value
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Parse a price out of display text such as `$129`, `€45.50` or `USD 245`
///
/// `$`, `€` and `£` map to USD, EUR and GBP; a three-letter code is taken
/// verbatim; otherwise `default_currency` applies.
pub fn parse_price_text(text: &str, default_currency: &str) -> Option<Money> {
    let cleaned = text.replace(',', "");
    let caps = PRICE_TEXT.captures(&cleaned)?;
    let amount: f64 = caps[2].parse().ok()?;
    let currency = match caps.get(1).map(|m| m.as_str()) {
        Some("$") => "USD".to_string(),
        Some("€") => "EUR".to_string(),
        Some("£") => "GBP".to_string(),
        Some(code) => code.to_string(),
        None => default_currency.to_string(),
    };
    Some(Money::new(amount, currency))
}
