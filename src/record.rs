//! Product Records - Validated Row Contracts
//!
//! A `ProductRecord` is the immutable, already-validated form of one sheet
//! row. Construction normally happens in [`crate::sheet`]; everything
//! downstream treats the record as a value.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_STYLE_PACK: &str = "minimal_white";
pub const DEFAULT_OUTPUT_SET: &str = "minimum";

/// Display units for the dimensions line. Values are carried verbatim into
/// `meta/product.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Cm,
    In,
}

impl Units {
    /// Parse a lower-cased unit token; anything but `cm`/`in` is unsupported.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cm" => Some(Units::Cm),
            "in" => Some(Units::In),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Units::Cm => "cm",
            Units::In => "in",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated product row.
///
/// Invariants (enforced at read time, re-checked where cheap):
/// `product_id` equals its own `safe_id` form; `specs` and `steps` hold at
/// least 3 entries; English-only fields passed the text policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_name_en: String,
    pub style_pack: String,
    pub output_set: String,

    pub units: Units,
    pub dimensions_l: Option<String>,
    pub dimensions_w: Option<String>,
    pub dimensions_h: Option<String>,

    pub specs: Vec<String>,
    pub howto_title: String,
    pub steps: Vec<String>,
    pub tips: Vec<String>,

    pub manager_notes: Option<String>,
    pub must_have_keywords: Option<String>,
    pub must_avoid_elements: Option<String>,

    pub personalization_text_en: Option<String>,
}

impl ProductRecord {
    /// Dimensions display line, present only when all three dimension
    /// strings were supplied: `Dimensions: L x W x H <units>`.
    pub fn dimensions_line(&self) -> Option<String> {
        match (&self.dimensions_l, &self.dimensions_w, &self.dimensions_h) {
            (Some(l), Some(w), Some(h))
                if !l.is_empty() && !w.is_empty() && !h.is_empty() =>
            {
                Some(format!("Dimensions: {l} x {w} x {h} {}", self.units))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_dims(
        l: Option<&str>,
        w: Option<&str>,
        h: Option<&str>,
    ) -> ProductRecord {
        ProductRecord {
            product_id: "SKU1".into(),
            product_name_en: "Thing".into(),
            style_pack: DEFAULT_STYLE_PACK.into(),
            output_set: DEFAULT_OUTPUT_SET.into(),
            units: Units::Cm,
            dimensions_l: l.map(String::from),
            dimensions_w: w.map(String::from),
            dimensions_h: h.map(String::from),
            specs: vec!["a".into(), "b".into(), "c".into()],
            howto_title: "How to Use".into(),
            steps: vec!["1".into(), "2".into(), "3".into()],
            tips: vec![],
            manager_notes: None,
            must_have_keywords: None,
            must_avoid_elements: None,
            personalization_text_en: None,
        }
    }

    #[test]
    fn dimensions_line_requires_all_three() {
        let full = record_with_dims(Some("20"), Some("8"), Some("8"));
        assert_eq!(
            full.dimensions_line().as_deref(),
            Some("Dimensions: 20 x 8 x 8 cm")
        );

        assert_eq!(record_with_dims(Some("20"), Some("8"), None).dimensions_line(), None);
        assert_eq!(record_with_dims(None, None, None).dimensions_line(), None);
        // Empty strings count as missing.
        assert_eq!(record_with_dims(Some("20"), Some(""), Some("8")).dimensions_line(), None);
    }

    #[test]
    fn units_parse_and_display() {
        assert_eq!(Units::parse("cm"), Some(Units::Cm));
        assert_eq!(Units::parse("in"), Some(Units::In));
        assert_eq!(Units::parse("mm"), None);
        assert_eq!(Units::In.to_string(), "in");
    }
}
