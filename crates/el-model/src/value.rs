//! Raw edit values.
//!
//! Edits arrive from text boxes, sliders and scripts, so a value may be an
//! integer, a float, a string or an explicit null. Coercion to the leaf type
//! happens when the edit is applied, not when it is built.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A loosely typed scalar written to a leaf of the snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    /// Clears an optional leaf.
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl PatchValue {
    /// Interpret text the way a command line or form field would: `null`,
    /// then an integer, then a float, otherwise plain text.
    pub fn parse_loose(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("null") || trimmed.is_empty() {
            return Self::Null;
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Self::Int(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return Self::Float(v);
        }
        Self::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value; numeric-looking text is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Integer view of the value. Floats round half to even.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(*v),
            Self::Float(v) => float_to_i64(*v),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

fn float_to_i64(v: f64) -> Option<i64> {
    if !v.is_finite() {
        return None;
    }
    let rounded = v.round_ties_even();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

impl fmt::Display for PatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<f64> for PatchValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for PatchValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for PatchValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PatchValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for PatchValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for PatchValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PatchValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<PatchValue>> From<Option<T>> for PatchValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_coerces() {
        assert_eq!(PatchValue::from("78.5").as_f64(), Some(78.5));
        assert_eq!(PatchValue::from(" 7200 ").as_i64(), Some(7200));
        assert_eq!(PatchValue::from("7200.0").as_i64(), Some(7200));
        assert_eq!(PatchValue::from("uel").as_f64(), None);
    }

    #[test]
    fn floats_round_half_to_even() {
        assert_eq!(PatchValue::Float(7250.5).as_i64(), Some(7250));
        assert_eq!(PatchValue::Float(7251.5).as_i64(), Some(7252));
        assert_eq!(PatchValue::Float(f64::NAN).as_i64(), None);
    }

    #[test]
    fn parse_loose_prefers_integers() {
        assert_eq!(PatchValue::parse_loose("42"), PatchValue::Int(42));
        assert_eq!(PatchValue::parse_loose("4.2"), PatchValue::Float(4.2));
        assert_eq!(PatchValue::parse_loose("NULL"), PatchValue::Null);
        assert_eq!(
            PatchValue::parse_loose("UEL"),
            PatchValue::Text("UEL".to_string())
        );
    }

    #[test]
    fn untagged_json_shapes() {
        let values: Vec<PatchValue> = serde_json::from_str(r#"[null, 3, 3.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                PatchValue::Null,
                PatchValue::Int(3),
                PatchValue::Float(3.5),
                PatchValue::Text("x".to_string())
            ]
        );
    }

    #[test]
    fn options_map_to_null() {
        assert_eq!(PatchValue::from(None::<f64>), PatchValue::Null);
        assert_eq!(PatchValue::from(Some(1.5)), PatchValue::Float(1.5));
    }
}
