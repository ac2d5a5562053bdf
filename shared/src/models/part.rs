//! Spare part models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

/// Payload for creating or updating a part.
///
/// `quantity` is only read on create (opening stock); afterwards stock moves
/// exclusively through transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PartInput {
    #[validate(required, custom = "not_blank")]
    pub name: Option<String>,
    #[validate(required, custom = "not_blank")]
    pub part_number: Option<String>,
    #[validate(required, custom = "not_blank")]
    pub motor_type: Option<String>,
    #[validate(required, custom = "not_blank")]
    pub part_type: Option<String>,
    #[validate(required, range(min = 0, max = 1000000000000))]
    pub price: Option<i64>,
    #[validate(required, range(min = 0, max = 1000000000000))]
    pub workshop_price: Option<i64>,
    #[validate(required, range(min = 0, max = 1000000000000))]
    pub install_price: Option<i64>,
    #[validate(range(min = 0, max = 100000))]
    pub quantity: Option<i64>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub storage_id: Option<Uuid>,
}

/// Search and filter parameters for the parts listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartFilter {
    /// Contains-match over name, part number, motor type, part type and brand name
    pub q: Option<String>,
    pub brand: Option<Uuid>,
    pub category: Option<Uuid>,
    pub motor_type: Option<String>,
    pub page: Option<i64>,
}

impl PartFilter {
    /// `%term%` pattern for ILIKE, or `None` when no search term was given
    pub fn search_pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)))
    }

    /// Case-insensitive exact-match pattern for the motor type filter
    pub fn motor_type_pattern(&self) -> Option<String> {
        self.motor_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(escape_like)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = PartFilter {
            q: Some(" 50%_off ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn test_motor_type_pattern_is_literal() {
        let filter = PartFilter {
            motor_type: Some(" Vario_125% ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter.motor_type_pattern().as_deref(),
            Some("Vario\\_125\\%")
        );
    }

    #[test]
    fn test_blank_search_is_none() {
        let filter = PartFilter {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(filter.search_pattern().is_none());
    }
}
