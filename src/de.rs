//! Field deserializers for payload numbers.
//!
//! The API is inconsistent about numeric encoding: amounts arrive as JSON
//! numbers, as decimal strings (`"1.5"`), or as `null` when unknown. These
//! helpers accept all three and still reject strings that are not numbers.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

/// `f64` from a number, a numeric string, or `null` (zero).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&s), &"a number")),
    }
}

/// `i64` from an integer, an integer string, or `null` (zero).
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        String(String),
    }

    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(IntOrString::Int(n)) => Ok(n),
        Some(IntOrString::String(s)) if s.trim().is_empty() => Ok(0),
        Some(IntOrString::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&s), &"an integer")),
    }
}
