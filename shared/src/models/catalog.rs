//! Reference catalog models (brands, categories, storage bins, suppliers,
//! salesmen, mechanics, customers)

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::AuditTable;
use crate::validation::not_blank;

/// Kinds of reference entries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Brand,
    Category,
    Storage,
    Supplier,
    Salesman,
    Mechanic,
    Customer,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 7] = [
        CatalogKind::Brand,
        CatalogKind::Category,
        CatalogKind::Storage,
        CatalogKind::Supplier,
        CatalogKind::Salesman,
        CatalogKind::Mechanic,
        CatalogKind::Customer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Brand => "brand",
            CatalogKind::Category => "category",
            CatalogKind::Storage => "storage",
            CatalogKind::Supplier => "supplier",
            CatalogKind::Salesman => "salesman",
            CatalogKind::Mechanic => "mechanic",
            CatalogKind::Customer => "customer",
        }
    }

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Brand => "brands",
            CatalogKind::Category => "categories",
            CatalogKind::Storage => "storages",
            CatalogKind::Supplier => "suppliers",
            CatalogKind::Salesman => "salesmen",
            CatalogKind::Mechanic => "mechanics",
            CatalogKind::Customer => "customers",
        }
    }

    pub fn audit_table(&self) -> AuditTable {
        match self {
            CatalogKind::Brand => AuditTable::Brand,
            CatalogKind::Category => AuditTable::Category,
            CatalogKind::Storage => AuditTable::Storage,
            CatalogKind::Supplier => AuditTable::Supplier,
            CatalogKind::Salesman => AuditTable::Salesman,
            CatalogKind::Mechanic => AuditTable::Mechanic,
            CatalogKind::Customer => AuditTable::Customer,
        }
    }

    /// People and companies carry contact details; labels (brand, category, bin) do not
    pub fn has_contact(&self) -> bool {
        matches!(
            self,
            CatalogKind::Supplier | CatalogKind::Salesman | CatalogKind::Mechanic | CatalogKind::Customer
        )
    }

    /// Only salesmen belong to a supplier
    pub fn has_supplier(&self) -> bool {
        matches!(self, CatalogKind::Salesman)
    }
}

/// Payload for creating or updating a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CatalogInput {
    #[validate(required, custom = "not_blank")]
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub supplier_id: Option<Uuid>,
}
