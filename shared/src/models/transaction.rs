//! Transaction families

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::AuditTable;
use crate::report::month_bounds;
use crate::types::PageRequest;
use crate::validation::ValidationCode;

/// The three kinds of stock-moving transactions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionFamily {
    /// Parts leave the shelf to a customer
    Sales,
    /// Parts arrive from a supplier
    Restock,
    /// Workshop job consuming parts and charging labor
    Service,
}

impl TransactionFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionFamily::Sales => "sales",
            TransactionFamily::Restock => "restock",
            TransactionFamily::Service => "service",
        }
    }

    pub fn audit_table(&self) -> AuditTable {
        match self {
            TransactionFamily::Sales => AuditTable::Sales,
            TransactionFamily::Restock => AuditTable::Restock,
            TransactionFamily::Service => AuditTable::Service,
        }
    }

    /// Whether creating a transaction of this family adds stock
    pub fn is_inbound(&self) -> bool {
        matches!(self, TransactionFamily::Restock)
    }
}

/// Query parameters for transaction listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub page: Option<i64>,
}

impl TransactionFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page)
    }

    /// UTC bounds of the requested local month; year and month come together
    pub fn period(
        &self,
        offset: FixedOffset,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ValidationCode> {
        match (self.year, self.month) {
            (None, None) => Ok(None),
            (Some(year), Some(month)) => month_bounds(year, month, offset).map(Some),
            _ => Err(ValidationCode::InvalidPeriod),
        }
    }
}
