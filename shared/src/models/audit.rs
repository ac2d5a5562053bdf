//! Audit log models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of mutation recorded in the audit log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    Create,
    Edit,
    Remove,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Create => "create",
            AuditOperation::Edit => "edit",
            AuditOperation::Remove => "remove",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tables whose mutations are audited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AuditTable {
    Sparepart,
    Sales,
    Restock,
    Service,
    Brand,
    Category,
    Storage,
    Supplier,
    Salesman,
    Mechanic,
    Customer,
    Profile,
}

impl AuditTable {
    pub const ALL: [AuditTable; 12] = [
        AuditTable::Sparepart,
        AuditTable::Sales,
        AuditTable::Restock,
        AuditTable::Service,
        AuditTable::Brand,
        AuditTable::Category,
        AuditTable::Storage,
        AuditTable::Supplier,
        AuditTable::Salesman,
        AuditTable::Mechanic,
        AuditTable::Customer,
        AuditTable::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTable::Sparepart => "sparepart",
            AuditTable::Sales => "sales",
            AuditTable::Restock => "restock",
            AuditTable::Service => "service",
            AuditTable::Brand => "brand",
            AuditTable::Category => "category",
            AuditTable::Storage => "storage",
            AuditTable::Supplier => "supplier",
            AuditTable::Salesman => "salesman",
            AuditTable::Mechanic => "mechanic",
            AuditTable::Customer => "customer",
            AuditTable::Profile => "profile",
        }
    }
}

impl FromStr for AuditTable {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditTable::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_parse_back() {
        for table in AuditTable::ALL {
            assert_eq!(table.as_str().parse::<AuditTable>(), Ok(table));
        }
        assert!("lots".parse::<AuditTable>().is_err());
    }
}
