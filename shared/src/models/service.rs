//! Workshop service job models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::stock::StockLine;
use crate::validation::not_blank;

/// Payload for creating or replacing a service job.
///
/// `actions` are labor lines and never touch stock; `content` lists the parts
/// consumed by the job.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceInput {
    #[validate(required, custom = "not_blank")]
    pub police_number: Option<String>,
    #[validate(required, custom = "not_blank")]
    pub motor_type: Option<String>,
    #[validate(required)]
    pub mechanic_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub is_paid_off: bool,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000000000))]
    pub deposit: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000000000))]
    pub discount: i64,
    #[serde(default)]
    #[validate]
    pub actions: Vec<ServiceActionInput>,
    #[serde(default)]
    #[validate]
    pub content: Vec<ServicePartInput>,
}

/// Labor line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceActionInput {
    pub id: Option<Uuid>,
    #[validate(required, custom = "not_blank")]
    pub name: Option<String>,
    #[validate(required, range(min = 0, max = 1000000000000))]
    pub cost: Option<i64>,
}

/// Part consumed by the job
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServicePartInput {
    pub id: Option<Uuid>,
    #[validate(required)]
    pub part_id: Option<Uuid>,
    #[validate(required, range(min = 1, max = 100000))]
    pub quantity: Option<i64>,
}

impl ServiceInput {
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.content
            .iter()
            .filter_map(|line| StockLine::from_parts(line.part_id, line.quantity))
            .collect()
    }
}
