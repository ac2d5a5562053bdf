//! Restock (inbound) transaction models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::stock::StockLine;
use crate::types::date_format;
use crate::validation::not_blank;

/// Payload for creating or replacing a restock from a supplier
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RestockInput {
    #[validate(required, custom = "not_blank")]
    pub invoice_number: Option<String>,
    #[serde(default, with = "date_format::option")]
    #[validate(required)]
    pub due_date: Option<NaiveDate>,
    #[validate(required)]
    pub supplier_id: Option<Uuid>,
    pub salesman_id: Option<Uuid>,
    #[serde(default)]
    pub is_paid_off: bool,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000000000))]
    pub deposit: i64,
    #[serde(default)]
    #[validate]
    pub content: Vec<RestockLineInput>,
}

/// One restock line with the unit price paid to the supplier
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RestockLineInput {
    pub id: Option<Uuid>,
    #[validate(required)]
    pub part_id: Option<Uuid>,
    #[validate(required, range(min = 1, max = 100000))]
    pub quantity: Option<i64>,
    #[validate(required, range(min = 0, max = 1000000000000))]
    pub individual_price: Option<i64>,
}

impl RestockInput {
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.content
            .iter()
            .filter_map(|line| StockLine::from_parts(line.part_id, line.quantity))
            .collect()
    }
}
