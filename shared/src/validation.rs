//! Input validation for parts, transactions and reference data
//!
//! Shape checks are declared on the payload types with `validator`; this
//! module turns their failures into the stable codes the boundary localizes,
//! and adds the business rules that span several fields.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::{
    CatalogInput, CatalogKind, PartInput, ProfileInput, RestockInput, SalesInput, ServiceInput,
    TransactionFamily,
};

/// Largest accepted part image (1 MiB)
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Upper bound for one line quantity and for opening stock.
/// Mirrored by the `range(max = ...)` attributes on the payload types.
pub const MAX_QUANTITY: i64 = 100_000;

/// Upper bound for any single money amount (rupiah).
/// Mirrored by the `range(max = ...)` attributes on the payload types.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Validation failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    #[error("sales payload incomplete")]
    SalesIncomplete,
    #[error("restock payload incomplete")]
    RestockIncomplete,
    #[error("service payload incomplete")]
    ServiceIncomplete,
    #[error("sparepart payload incomplete")]
    #[serde(rename = "SPAREPART_INCOMPLETE")]
    PartIncomplete,
    #[error("catalog payload incomplete")]
    CatalogIncomplete,
    #[error("profile payload incomplete")]
    ProfileIncomplete,
    #[error("both customer_id and inline customer given")]
    CustomerConflict,
    #[error("customer reference incomplete")]
    CustomerIncomplete,
    #[error("image larger than 1 MiB")]
    ImageTooLarge,
    #[error("image missing")]
    ImageMissing,
    #[error("part listed more than once")]
    DuplicatePart,
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("quantity or amount exceeds the allowed maximum")]
    ValueTooLarge,
    #[error("line does not belong to this transaction")]
    UnknownLine,
    #[error("referenced record does not exist")]
    UnknownReference,
    #[error("record already exists")]
    Duplicate,
    #[error("invalid report period")]
    InvalidPeriod,
    #[error("malformed request body")]
    Malformed,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::SalesIncomplete => "SALES_INCOMPLETE",
            ValidationCode::RestockIncomplete => "RESTOCK_INCOMPLETE",
            ValidationCode::ServiceIncomplete => "SERVICE_INCOMPLETE",
            ValidationCode::PartIncomplete => "SPAREPART_INCOMPLETE",
            ValidationCode::CatalogIncomplete => "CATALOG_INCOMPLETE",
            ValidationCode::ProfileIncomplete => "PROFILE_INCOMPLETE",
            ValidationCode::CustomerConflict => "CUSTOMER_CONFLICT",
            ValidationCode::CustomerIncomplete => "CUSTOMER_INCOMPLETE",
            ValidationCode::ImageTooLarge => "IMAGE_TOO_LARGE",
            ValidationCode::ImageMissing => "IMAGE_MISSING",
            ValidationCode::DuplicatePart => "DUPLICATE_PART",
            ValidationCode::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            ValidationCode::NegativeAmount => "NEGATIVE_AMOUNT",
            ValidationCode::ValueTooLarge => "VALUE_TOO_LARGE",
            ValidationCode::UnknownLine => "UNKNOWN_LINE",
            ValidationCode::UnknownReference => "UNKNOWN_REFERENCE",
            ValidationCode::Duplicate => "DUPLICATE",
            ValidationCode::InvalidPeriod => "INVALID_PERIOD",
            ValidationCode::Malformed => "MALFORMED",
        }
    }

    /// The family-level "incomplete" code
    pub fn incomplete(family: TransactionFamily) -> Self {
        match family {
            TransactionFamily::Sales => ValidationCode::SalesIncomplete,
            TransactionFamily::Restock => ValidationCode::RestockIncomplete,
            TransactionFamily::Service => ValidationCode::ServiceIncomplete,
        }
    }
}

/// Custom `validator` rule: the string must contain something besides whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

// ============================================================================
// Mapping declarative failures to codes
// ============================================================================

/// One declarative failure: field, rule and whether the offending value was
/// above zero (a range failure on a positive value overshot the maximum)
type Failure = (&'static str, String, bool);

/// Collect failures from a possibly nested error tree
fn collect_failures(errors: &ValidationErrors, out: &mut Vec<Failure>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| {
                    let positive = e
                        .params
                        .get("value")
                        .and_then(|v| v.as_f64())
                        .is_some_and(|v| v > 0.0);
                    (*field, e.code.to_string(), positive)
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_failures(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_failures(inner, out);
                }
            }
        }
    }
}

/// Reduce a `validator` failure to one code.
///
/// Missing or blank fields win over range failures so the caller first learns
/// the payload is incomplete.
fn shape_code(errors: &ValidationErrors, incomplete: ValidationCode) -> ValidationCode {
    let mut failures = Vec::new();
    collect_failures(errors, &mut failures);

    let rank = |(field, code, positive): &Failure| match (code.as_str(), *field, *positive) {
        ("range", _, true) => 3,
        ("range", "quantity", false) => 1,
        ("range", _, false) => 2,
        _ => 0,
    };

    match failures.iter().map(rank).min() {
        Some(1) => ValidationCode::NonPositiveQuantity,
        Some(2) => ValidationCode::NegativeAmount,
        Some(3) => ValidationCode::ValueTooLarge,
        _ => incomplete,
    }
}

fn check_shape<T: Validate>(input: &T, incomplete: ValidationCode) -> Result<(), ValidationCode> {
    input.validate().map_err(|e| shape_code(&e, incomplete))
}

fn check_unique_parts<I>(part_ids: I) -> Result<(), ValidationCode>
where
    I: IntoIterator<Item = Option<Uuid>>,
{
    let mut seen = HashSet::new();
    for part_id in part_ids.into_iter().flatten() {
        if !seen.insert(part_id) {
            return Err(ValidationCode::DuplicatePart);
        }
    }
    Ok(())
}

// ============================================================================
// Payload validations
// ============================================================================

/// Validate a sales payload, including the customer exclusivity rule:
/// `customer_id` XOR (`customer_name` AND `customer_contact`).
pub fn validate_sales(input: &SalesInput) -> Result<(), ValidationCode> {
    let incomplete = ValidationCode::SalesIncomplete;
    check_shape(input, incomplete)?;
    if input.content.is_empty() {
        return Err(incomplete);
    }

    let has_name = input.inline_name().is_some();
    let has_contact = input.inline_contact().is_some();
    match (input.customer_id.is_some(), has_name, has_contact) {
        (true, false, false) | (false, true, true) => {}
        (true, _, _) => return Err(ValidationCode::CustomerConflict),
        (false, _, _) => return Err(ValidationCode::CustomerIncomplete),
    }

    check_unique_parts(input.content.iter().map(|l| l.part_id))
}

pub fn validate_restock(input: &RestockInput) -> Result<(), ValidationCode> {
    let incomplete = ValidationCode::RestockIncomplete;
    check_shape(input, incomplete)?;
    if input.content.is_empty() {
        return Err(incomplete);
    }
    check_unique_parts(input.content.iter().map(|l| l.part_id))
}

/// A service job needs at least one labor action or one consumed part
pub fn validate_service(input: &ServiceInput) -> Result<(), ValidationCode> {
    let incomplete = ValidationCode::ServiceIncomplete;
    check_shape(input, incomplete)?;
    if input.content.is_empty() && input.actions.is_empty() {
        return Err(incomplete);
    }
    check_unique_parts(input.content.iter().map(|l| l.part_id))
}

pub fn validate_part(input: &PartInput) -> Result<(), ValidationCode> {
    check_shape(input, ValidationCode::PartIncomplete)
}

pub fn validate_catalog(kind: CatalogKind, input: &CatalogInput) -> Result<(), ValidationCode> {
    check_shape(input, ValidationCode::CatalogIncomplete)?;
    if input.supplier_id.is_some() && !kind.has_supplier() {
        return Err(ValidationCode::CatalogIncomplete);
    }
    let has_contact_fields = [&input.contact, &input.address]
        .iter()
        .any(|v| v.as_deref().is_some_and(|v| !v.trim().is_empty()));
    if has_contact_fields && !kind.has_contact() {
        return Err(ValidationCode::CatalogIncomplete);
    }
    Ok(())
}

pub fn validate_profile(input: &ProfileInput) -> Result<(), ValidationCode> {
    check_shape(input, ValidationCode::ProfileIncomplete)
}

/// Reject uploads over `limit` bytes
pub fn validate_image_size(len: usize, limit: usize) -> Result<(), ValidationCode> {
    if len == 0 {
        return Err(ValidationCode::ImageMissing);
    }
    if len > limit {
        return Err(ValidationCode::ImageTooLarge);
    }
    Ok(())
}

/// Report periods must name a real calendar month
pub fn validate_period(year: i32, month: u32) -> Result<(), ValidationCode> {
    let valid = (1970..=9999).contains(&year)
        && chrono::NaiveDate::from_ymd_opt(year, month, 1).is_some();
    if valid {
        Ok(())
    } else {
        Err(ValidationCode::InvalidPeriod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SalesLineInput, ServiceActionInput};

    fn sales_line(part_id: Uuid, quantity: i64) -> SalesLineInput {
        SalesLineInput {
            id: None,
            part_id: Some(part_id),
            quantity: Some(quantity),
            is_workshop: false,
        }
    }

    fn sales(customer_id: Option<Uuid>, name: Option<&str>, contact: Option<&str>) -> SalesInput {
        SalesInput {
            customer_id,
            customer_name: name.map(String::from),
            customer_contact: contact.map(String::from),
            is_paid_off: false,
            deposit: 0,
            content: vec![sales_line(Uuid::new_v4(), 1)],
        }
    }

    // ========================================================================
    // Sales customer rule
    // ========================================================================

    #[test]
    fn test_customer_by_id() {
        assert_eq!(validate_sales(&sales(Some(Uuid::new_v4()), None, None)), Ok(()));
    }

    #[test]
    fn test_customer_inline() {
        assert_eq!(
            validate_sales(&sales(None, Some("Budi"), Some("0812"))),
            Ok(())
        );
    }

    #[test]
    fn test_customer_conflict() {
        assert_eq!(
            validate_sales(&sales(Some(Uuid::new_v4()), Some("A"), None)),
            Err(ValidationCode::CustomerConflict)
        );
    }

    #[test]
    fn test_customer_name_only_incomplete() {
        assert_eq!(
            validate_sales(&sales(None, Some("A"), None)),
            Err(ValidationCode::CustomerIncomplete)
        );
    }

    #[test]
    fn test_customer_missing_incomplete() {
        assert_eq!(
            validate_sales(&sales(None, None, None)),
            Err(ValidationCode::CustomerIncomplete)
        );
    }

    #[test]
    fn test_blank_inline_counts_as_absent() {
        assert_eq!(
            validate_sales(&sales(Some(Uuid::new_v4()), Some("  "), Some(""))),
            Ok(())
        );
    }

    // ========================================================================
    // Shape
    // ========================================================================

    #[test]
    fn test_empty_content_is_incomplete() {
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.content.clear();
        assert_eq!(validate_sales(&input), Err(ValidationCode::SalesIncomplete));
    }

    #[test]
    fn test_line_without_part_is_incomplete() {
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.content[0].part_id = None;
        assert_eq!(validate_sales(&input), Err(ValidationCode::SalesIncomplete));
    }

    #[test]
    fn test_zero_quantity() {
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.content[0].quantity = Some(0);
        assert_eq!(
            validate_sales(&input),
            Err(ValidationCode::NonPositiveQuantity)
        );
    }

    #[test]
    fn test_negative_deposit() {
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.deposit = -1;
        assert_eq!(validate_sales(&input), Err(ValidationCode::NegativeAmount));
    }

    #[test]
    fn test_quantity_above_maximum() {
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.content[0].quantity = Some(MAX_QUANTITY);
        assert_eq!(validate_sales(&input), Ok(()));

        input.content[0].quantity = Some(i64::MAX);
        assert_eq!(validate_sales(&input), Err(ValidationCode::ValueTooLarge));
    }

    #[test]
    fn test_deposit_above_maximum() {
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.deposit = MAX_AMOUNT + 1;
        assert_eq!(validate_sales(&input), Err(ValidationCode::ValueTooLarge));
    }

    #[test]
    fn test_duplicate_part() {
        let part = Uuid::new_v4();
        let mut input = sales(Some(Uuid::new_v4()), None, None);
        input.content = vec![sales_line(part, 1), sales_line(part, 2)];
        assert_eq!(validate_sales(&input), Err(ValidationCode::DuplicatePart));
    }

    #[test]
    fn test_service_labor_only() {
        let input = ServiceInput {
            police_number: Some("AB 1234 CD".into()),
            motor_type: Some("Vario 125".into()),
            mechanic_id: Some(Uuid::new_v4()),
            customer_id: None,
            is_paid_off: true,
            deposit: 50_000,
            discount: 0,
            actions: vec![ServiceActionInput {
                id: None,
                name: Some("Ganti oli".into()),
                cost: Some(25_000),
            }],
            content: vec![],
        };
        assert_eq!(validate_service(&input), Ok(()));

        let empty = ServiceInput {
            actions: vec![],
            ..input
        };
        assert_eq!(
            validate_service(&empty),
            Err(ValidationCode::ServiceIncomplete)
        );
    }

    #[test]
    fn test_catalog_supplier_only_on_salesman() {
        let input = CatalogInput {
            name: Some("Andi".into()),
            contact: None,
            address: None,
            supplier_id: Some(Uuid::new_v4()),
        };
        assert_eq!(validate_catalog(CatalogKind::Salesman, &input), Ok(()));
        assert_eq!(
            validate_catalog(CatalogKind::Brand, &input),
            Err(ValidationCode::CatalogIncomplete)
        );
    }

    #[test]
    fn test_catalog_contact_only_on_contact_kinds() {
        let input = CatalogInput {
            name: Some("Astra Motor".into()),
            contact: Some("021-555".into()),
            address: None,
            supplier_id: None,
        };
        assert_eq!(validate_catalog(CatalogKind::Supplier, &input), Ok(()));
        assert_eq!(
            validate_catalog(CatalogKind::Storage, &input),
            Err(ValidationCode::CatalogIncomplete)
        );

        let blank = CatalogInput {
            contact: Some("  ".into()),
            ..input
        };
        assert_eq!(validate_catalog(CatalogKind::Storage, &blank), Ok(()));
    }

    // ========================================================================
    // Image and period
    // ========================================================================

    #[test]
    fn test_image_size() {
        assert_eq!(validate_image_size(MAX_IMAGE_BYTES, MAX_IMAGE_BYTES), Ok(()));
        assert_eq!(
            validate_image_size(MAX_IMAGE_BYTES + 1, MAX_IMAGE_BYTES),
            Err(ValidationCode::ImageTooLarge)
        );
        assert_eq!(
            validate_image_size(0, MAX_IMAGE_BYTES),
            Err(ValidationCode::ImageMissing)
        );
    }

    #[test]
    fn test_period() {
        assert_eq!(validate_period(2024, 2), Ok(()));
        assert_eq!(validate_period(2024, 13), Err(ValidationCode::InvalidPeriod));
        assert_eq!(validate_period(2024, 0), Err(ValidationCode::InvalidPeriod));
        assert_eq!(validate_period(1900, 5), Err(ValidationCode::InvalidPeriod));
    }
}
