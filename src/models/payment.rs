use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PaymentIntentRequest {
    /// Price in major currency units (e.g. dollars). Numeric strings are accepted.
    #[serde(default)]
    #[schema(value_type = f64)]
    pub price: Value,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Numeric value of a loosely typed price: numbers as-is, booleans as 0/1,
/// numeric strings parsed (blank is 0, `0x`/`0o`/`0b` prefixes allowed).
/// `None` when the value has no finite numeric reading.
pub fn price_value(price: &Value) -> Option<f64> {
    let n = match price {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => parse_numeric_str(s)?,
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    let radix = match s.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).ok().map(|v| v as f64);
    }

    // Rust also reads "inf"/"nan" spellings; only plain decimal notation counts
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Converts a major-unit price to integer minor units, truncating toward zero:
/// `10` → `1000`, `19.999` → `1999`. Float error is not corrected, so `0.29`
/// gives `28` like the storefront's own conversion.
pub fn to_minor_units(price: &Value) -> Option<i64> {
    price_value(price).map(|n| (n * 100.0).trunc() as i64)
}
