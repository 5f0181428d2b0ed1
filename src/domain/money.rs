//! Rupiah amounts, the sales tax rule and the display formatter.

use serde::{de, Deserialize, Deserializer};

/// Whole Rupiah. The currency has no minor unit in practice, so prices,
/// subtotals and tendered cash are all integers.
pub type Amount = u64;

/// Sales tax applied on top of the cart subtotal.
pub const TAX_RATE_PERCENT: Amount = 10;

/// Tax owed on `subtotal`, truncated toward zero.
pub fn tax_on(subtotal: Amount) -> Amount {
    (u128::from(subtotal) * u128::from(TAX_RATE_PERCENT) / 100) as Amount
}

/// Formats an amount the way the id-ID locale does: `Rp 1.234.567`.
pub fn format_rupiah(amount: Amount) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp {}", grouped)
}

/// JSON forms an amount arrives in. NUMERIC columns come through as
/// decimal strings such as `"10000.00"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireAmount {
    Whole(u64),
    Float(f64),
    Text(String),
}

impl WireAmount {
    fn into_amount<E: de::Error>(self) -> Result<Amount, E> {
        let amount = match &self {
            WireAmount::Whole(value) => Some(*value),
            WireAmount::Float(value) => whole_from_float(*value),
            WireAmount::Text(text) => whole_from_text(text),
        };
        amount.ok_or_else(|| E::custom(format!("invalid amount: {}", self)))
    }
}

impl std::fmt::Display for WireAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireAmount::Whole(value) => write!(f, "{}", value),
            WireAmount::Float(value) => write!(f, "{}", value),
            WireAmount::Text(text) => write!(f, "{:?}", text),
        }
    }
}

// 2^53: beyond this an f64 no longer holds every integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn whole_from_float(value: f64) -> Option<Amount> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_EXACT_FLOAT)
        .then(|| value as Amount)
}

/// Accepts `"10000"` and `"10000.00"`; a non-zero fraction is refused.
fn whole_from_text(text: &str) -> Option<Amount> {
    let text = text.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !fraction.bytes().all(|b| b == b'0') {
        return None;
    }
    whole.parse().ok()
}

/// Deserializes an [`Amount`] from an integer, a whole float or a decimal string.
pub fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    WireAmount::deserialize(deserializer)?.into_amount()
}

pub fn deserialize_optional_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Amount>, D::Error> {
    Option::<WireAmount>::deserialize(deserializer)?
        .map(WireAmount::into_amount)
        .transpose()
}
