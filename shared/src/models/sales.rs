//! Sales (outbound) transaction models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::stock::StockLine;

/// Payload for creating or replacing a sales transaction.
///
/// The customer is given either as a catalog `customer_id` or inline as
/// `customer_name` plus `customer_contact`, never both.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SalesInput {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub is_paid_off: bool,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000000000))]
    pub deposit: i64,
    #[serde(default)]
    #[validate]
    pub content: Vec<SalesLineInput>,
}

/// One sales line; `id` is set when amending an existing line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SalesLineInput {
    pub id: Option<Uuid>,
    #[validate(required)]
    pub part_id: Option<Uuid>,
    #[validate(required, range(min = 1, max = 100000))]
    pub quantity: Option<i64>,
    /// Sell at the workshop price instead of the retail price
    #[serde(default)]
    pub is_workshop: bool,
}

impl SalesInput {
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.content
            .iter()
            .filter_map(|line| StockLine::from_parts(line.part_id, line.quantity))
            .collect()
    }

    /// Inline customer name, trimmed, if given
    pub fn inline_name(&self) -> Option<&str> {
        present(&self.customer_name)
    }

    /// Inline customer contact, trimmed, if given
    pub fn inline_contact(&self) -> Option<&str> {
        present(&self.customer_contact)
    }
}

pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
