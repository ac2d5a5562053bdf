//! Error handling for the Bengkel Sparepart backend
//!
//! Every failure is one `AppError`; the boundary maps the kind to a status
//! code and renders the Indonesian message for its code.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::stock::{AdjustError, StockShortage};
use shared::{AccessError, CatalogKind, ValidationCode};
use thiserror::Error;

/// Entities that can be looked up by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Part,
    Sales,
    Restock,
    Service,
    Supplier,
    Customer,
    Brand,
    Category,
    Storage,
    Mechanic,
    Salesman,
    Profile,
}

impl Entity {
    pub fn code(&self) -> &'static str {
        match self {
            Entity::Part => "SPAREPART_NOT_FOUND",
            Entity::Sales => "SALES_NOT_FOUND",
            Entity::Restock => "RESTOCK_NOT_FOUND",
            Entity::Service => "SERVICE_NOT_FOUND",
            Entity::Supplier => "SUPPLIER_NOT_FOUND",
            Entity::Customer => "CUSTOMER_NOT_FOUND",
            Entity::Brand => "BRAND_NOT_FOUND",
            Entity::Category => "CATEGORY_NOT_FOUND",
            Entity::Storage => "STORAGE_NOT_FOUND",
            Entity::Mechanic => "MECHANIC_NOT_FOUND",
            Entity::Salesman => "SALESMAN_NOT_FOUND",
            Entity::Profile => "PROFILE_NOT_FOUND",
        }
    }

    fn label(&self) -> (&'static str, &'static str) {
        match self {
            Entity::Part => ("Sparepart", "Spare part"),
            Entity::Sales => ("Data penjualan", "Sales"),
            Entity::Restock => ("Data restock", "Restock"),
            Entity::Service => ("Data servis", "Service"),
            Entity::Supplier => ("Supplier", "Supplier"),
            Entity::Customer => ("Pelanggan", "Customer"),
            Entity::Brand => ("Merek", "Brand"),
            Entity::Category => ("Kategori", "Category"),
            Entity::Storage => ("Lokasi penyimpanan", "Storage"),
            Entity::Mechanic => ("Mekanik", "Mechanic"),
            Entity::Salesman => ("Sales supplier", "Salesman"),
            Entity::Profile => ("Profil", "Profile"),
        }
    }
}

impl From<CatalogKind> for Entity {
    fn from(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Brand => Entity::Brand,
            CatalogKind::Category => Entity::Category,
            CatalogKind::Storage => Entity::Storage,
            CatalogKind::Supplier => Entity::Supplier,
            CatalogKind::Salesman => Entity::Salesman,
            CatalogKind::Mechanic => Entity::Mechanic,
            CatalogKind::Customer => Entity::Customer,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Resource not found: {0:?}")]
    NotFound(Entity),

    // Validation and business rule errors
    #[error("Validation error: {0}")]
    Validation(ValidationCode),

    #[error(transparent)]
    InsufficientStock(StockShortage),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[source] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                Some("23505") => return AppError::Validation(ValidationCode::Duplicate),
                Some("23503") => return AppError::Validation(ValidationCode::UnknownReference),
                _ => {}
            }
        }
        AppError::DatabaseError(err)
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotLoggedIn => AppError::NotLoggedIn,
            AccessError::Forbidden => AppError::Forbidden,
        }
    }
}

impl From<ValidationCode> for AppError {
    fn from(code: ValidationCode) -> Self {
        AppError::Validation(code)
    }
}

impl From<AdjustError> for AppError {
    fn from(err: AdjustError) -> Self {
        match err {
            AdjustError::Shortage(shortage) => AppError::InsufficientStock(shortage),
            AdjustError::UnknownPart(_) => AppError::Validation(ValidationCode::UnknownReference),
            AdjustError::Overflow(_) => AppError::Validation(ValidationCode::ValueTooLarge),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        AppError::Validation(ValidationCode::Malformed)
    }
}

impl From<QueryRejection> for AppError {
    fn from(_: QueryRejection) -> Self {
        AppError::Validation(ValidationCode::Malformed)
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::Validation(ValidationCode::Malformed)
    }
}

impl From<MultipartRejection> for AppError {
    fn from(_: MultipartRejection) -> Self {
        AppError::Validation(ValidationCode::ImageMissing)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Validation(ValidationCode::ImageTooLarge)
        } else {
            AppError::Validation(ValidationCode::Malformed)
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    /// Localized (Indonesian) message
    pub message: String,
    pub message_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StockShortage>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotLoggedIn | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_)
            | AppError::StorageError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotLoggedIn => "NOT_LOGGED_IN",
            AppError::Forbidden => "FORBIDDEN",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NotFound(entity) => entity.code(),
            AppError::Validation(code) => code.as_str(),
            AppError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// `(Indonesian, English)` message for this error
    pub fn messages(&self) -> (String, String) {
        match self {
            AppError::NotLoggedIn => (
                "Anda belum login".to_string(),
                "You are not logged in".to_string(),
            ),
            AppError::Forbidden => (
                "Anda tidak memiliki akses untuk tindakan ini".to_string(),
                "You do not have permission to perform this action".to_string(),
            ),
            AppError::InvalidCredentials => (
                "Username atau password salah".to_string(),
                "Invalid username or password".to_string(),
            ),
            AppError::NotFound(entity) => {
                let (id, en) = entity.label();
                (format!("{} tidak ditemukan", id), format!("{} not found", en))
            }
            AppError::Validation(code) => {
                let (id, en) = validation_messages(*code);
                (id.to_string(), en.to_string())
            }
            AppError::InsufficientStock(s) => (
                format!(
                    "Stok tidak mencukupi: tersedia {}, diminta {}",
                    s.available, s.requested
                ),
                format!(
                    "Insufficient stock: {} available, {} requested",
                    s.available, s.requested
                ),
            ),
            AppError::DatabaseError(_) => (
                "Terjadi kesalahan pada database".to_string(),
                "A database error occurred".to_string(),
            ),
            AppError::StorageError(_) => (
                "Gagal menyimpan berkas".to_string(),
                "Failed to store file".to_string(),
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                "Terjadi kesalahan pada server".to_string(),
                "An internal server error occurred".to_string(),
            ),
        }
    }
}

fn validation_messages(code: ValidationCode) -> (&'static str, &'static str) {
    match code {
        ValidationCode::SalesIncomplete => (
            "Data penjualan belum lengkap",
            "Sales data is incomplete",
        ),
        ValidationCode::RestockIncomplete => (
            "Data restock belum lengkap",
            "Restock data is incomplete",
        ),
        ValidationCode::ServiceIncomplete => (
            "Data servis belum lengkap",
            "Service data is incomplete",
        ),
        ValidationCode::PartIncomplete => (
            "Data sparepart belum lengkap",
            "Spare part data is incomplete",
        ),
        ValidationCode::CatalogIncomplete => ("Data belum lengkap", "Data is incomplete"),
        ValidationCode::ProfileIncomplete => (
            "Data profil belum lengkap",
            "Profile data is incomplete",
        ),
        ValidationCode::CustomerConflict => (
            "Pilih pelanggan terdaftar atau isi nama dan kontak pelanggan, tidak keduanya",
            "Give either a registered customer or a name and contact, not both",
        ),
        ValidationCode::CustomerIncomplete => (
            "Nama dan kontak pelanggan harus diisi",
            "Customer name and contact are required",
        ),
        ValidationCode::ImageTooLarge => (
            "Ukuran gambar maksimal 1 MB",
            "Image must not exceed 1 MB",
        ),
        ValidationCode::ImageMissing => ("Gambar belum dipilih", "No image provided"),
        ValidationCode::DuplicatePart => (
            "Sparepart yang sama tidak boleh dimasukkan dua kali",
            "The same spare part may only appear once",
        ),
        ValidationCode::NonPositiveQuantity => (
            "Jumlah harus lebih dari nol",
            "Quantity must be greater than zero",
        ),
        ValidationCode::NegativeAmount => (
            "Nominal tidak boleh negatif",
            "Amounts must not be negative",
        ),
        ValidationCode::ValueTooLarge => (
            "Jumlah atau nominal melebihi batas",
            "Quantity or amount exceeds the allowed maximum",
        ),
        ValidationCode::UnknownLine => (
            "Item tidak termasuk dalam transaksi ini",
            "Line item does not belong to this transaction",
        ),
        ValidationCode::UnknownReference => (
            "Data yang dirujuk tidak ditemukan",
            "Referenced record does not exist",
        ),
        ValidationCode::Duplicate => ("Data sudah ada", "Record already exists"),
        ValidationCode::InvalidPeriod => (
            "Periode laporan tidak valid",
            "Invalid report period",
        ),
        ValidationCode::Malformed => ("Format data tidak valid", "Malformed request body"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, message_en) = self.messages();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "Error: {:?}", self);
        } else {
            tracing::warn!(code = self.code(), "Request rejected: {}", self);
        }

        let detail = match &self {
            AppError::InsufficientStock(shortage) => Some(*shortage),
            _ => None,
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
            message_en,
            detail,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
