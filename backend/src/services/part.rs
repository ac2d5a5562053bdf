//! Spare part service: catalog of parts and their on-hand quantity

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use shared::validation::{validate_image_size, validate_part};
use shared::{timestamp_format, to_local, AuditOperation, AuditTable, PageRequest, PartFilter, PartInput};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::{AppError, AppResult, Entity};
use crate::services::AuditService;

/// Spare part service
#[derive(Clone)]
pub struct PartService {
    db: PgPool,
    media_dir: PathBuf,
    max_image_bytes: usize,
}

/// Part as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub id: Uuid,
    pub name: String,
    pub part_number: String,
    pub motor_type: String,
    pub part_type: String,
    pub price: i64,
    pub workshop_price: i64,
    pub install_price: i64,
    pub quantity: i64,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub storage_id: Option<Uuid>,
    pub storage_name: Option<String>,
    pub image: Option<String>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, FromRow)]
struct PartRow {
    id: Uuid,
    name: String,
    part_number: String,
    motor_type: String,
    part_type: String,
    price: i64,
    workshop_price: i64,
    install_price: i64,
    quantity: i64,
    brand_id: Option<Uuid>,
    brand_name: Option<String>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    storage_id: Option<Uuid>,
    storage_name: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PartRow {
    fn into_part(self, offset: FixedOffset) -> Part {
        Part {
            id: self.id,
            name: self.name,
            part_number: self.part_number,
            motor_type: self.motor_type,
            part_type: self.part_type,
            price: self.price,
            workshop_price: self.workshop_price,
            install_price: self.install_price,
            quantity: self.quantity,
            brand_id: self.brand_id,
            brand_name: self.brand_name,
            category_id: self.category_id,
            category_name: self.category_name,
            storage_id: self.storage_id,
            storage_name: self.storage_name,
            image: self.image,
            created_at: to_local(self.created_at, offset),
            updated_at: to_local(self.updated_at, offset),
        }
    }
}

const PART_SELECT: &str = r#"
    SELECT p.id, p.name, p.part_number, p.motor_type, p.part_type,
           p.price, p.workshop_price, p.install_price, p.quantity,
           p.brand_id, b.name AS brand_name,
           p.category_id, c.name AS category_name,
           p.storage_id, s.name AS storage_name,
           p.image, p.created_at, p.updated_at
    FROM spareparts p
    LEFT JOIN brands b ON b.id = p.brand_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN storages s ON s.id = p.storage_id
"#;

const PART_FILTER: &str = r#"
    WHERE ($1::text IS NULL
           OR p.name ILIKE $1 ESCAPE '\' OR p.part_number ILIKE $1 ESCAPE '\'
           OR p.motor_type ILIKE $1 ESCAPE '\' OR p.part_type ILIKE $1 ESCAPE '\'
           OR b.name ILIKE $1 ESCAPE '\')
      AND ($2::uuid IS NULL OR p.brand_id = $2)
      AND ($3::uuid IS NULL OR p.category_id = $3)
      AND ($4::text IS NULL OR p.motor_type ILIKE $4 ESCAPE '\')
"#;

impl PartService {
    pub fn new(db: PgPool, media_dir: impl Into<PathBuf>, max_image_bytes: usize) -> Self {
        Self {
            db,
            media_dir: media_dir.into(),
            max_image_bytes,
        }
    }

    /// Filtered, paginated listing ordered by name
    pub async fn search(
        &self,
        filter: &PartFilter,
        offset: FixedOffset,
    ) -> AppResult<(Vec<Part>, i64)> {
        let pattern = filter.search_pattern();
        let motor_type = filter.motor_type_pattern();
        let page = PageRequest::new(filter.page);

        let count_sql = format!(
            "SELECT COUNT(*) FROM spareparts p LEFT JOIN brands b ON b.id = p.brand_id {}",
            PART_FILTER
        );
        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(pattern.as_deref())
            .bind(filter.brand)
            .bind(filter.category)
            .bind(motor_type.as_deref())
            .fetch_one(&self.db)
            .await?;

        let list_sql = format!(
            "{} {} ORDER BY p.name ASC, p.id ASC LIMIT $5 OFFSET $6",
            PART_SELECT, PART_FILTER
        );
        let rows = sqlx::query_as::<_, PartRow>(&list_sql)
            .bind(pattern.as_deref())
            .bind(filter.brand)
            .bind(filter.category)
            .bind(motor_type.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        Ok((rows.into_iter().map(|r| r.into_part(offset)).collect(), count))
    }

    pub async fn get(&self, id: Uuid, offset: FixedOffset) -> AppResult<Part> {
        let sql = format!("{} WHERE p.id = $1", PART_SELECT);
        let row = sqlx::query_as::<_, PartRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound(Entity::Part))?;

        Ok(row.into_part(offset))
    }

    /// Create a part; `quantity` is the opening stock
    pub async fn create(&self, ctx: &CallerContext, input: &PartInput) -> AppResult<Part> {
        validate_part(input)?;

        let mut tx = self.db.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO spareparts (
                name, part_number, motor_type, part_type,
                price, workshop_price, install_price, quantity,
                brand_id, category_id, storage_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING id
            "#,
        )
        .bind(trimmed(&input.name))
        .bind(trimmed(&input.part_number))
        .bind(trimmed(&input.motor_type))
        .bind(trimmed(&input.part_type))
        .bind(input.price)
        .bind(input.workshop_price)
        .bind(input.install_price)
        .bind(input.quantity.unwrap_or(0))
        .bind(input.brand_id)
        .bind(input.category_id)
        .bind(input.storage_id)
        .bind(ctx.now)
        .fetch_one(&mut *tx)
        .await?;

        AuditService::append(&mut tx, ctx, AuditTable::Sparepart, AuditOperation::Create).await?;
        tx.commit().await?;

        tracing::info!(
            part_id = %id,
            user_id = %ctx.user_id(),
            opening_quantity = input.quantity.unwrap_or(0),
            "Spare part created"
        );

        self.get(id, ctx.offset).await
    }

    /// Update descriptive fields and prices; quantity is left untouched
    pub async fn update(&self, ctx: &CallerContext, id: Uuid, input: &PartInput) -> AppResult<Part> {
        validate_part(input)?;

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE spareparts
            SET name = $2, part_number = $3, motor_type = $4, part_type = $5,
                price = $6, workshop_price = $7, install_price = $8,
                brand_id = $9, category_id = $10, storage_id = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(trimmed(&input.name))
        .bind(trimmed(&input.part_number))
        .bind(trimmed(&input.motor_type))
        .bind(trimmed(&input.part_type))
        .bind(input.price)
        .bind(input.workshop_price)
        .bind(input.install_price)
        .bind(input.brand_id)
        .bind(input.category_id)
        .bind(input.storage_id)
        .bind(ctx.now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(Entity::Part));
        }

        AuditService::append(&mut tx, ctx, AuditTable::Sparepart, AuditOperation::Edit).await?;
        tx.commit().await?;

        tracing::info!(part_id = %id, user_id = %ctx.user_id(), "Spare part updated");
        self.get(id, ctx.offset).await
    }

    /// Delete a part; historical lines keep their denormalized name
    pub async fn delete(&self, ctx: &CallerContext, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let image = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM spareparts WHERE id = $1 RETURNING image",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound(Entity::Part))?;

        AuditService::append(&mut tx, ctx, AuditTable::Sparepart, AuditOperation::Remove).await?;
        tx.commit().await?;

        if let Some(image) = image {
            self.remove_file(&image).await;
        }

        tracing::info!(part_id = %id, user_id = %ctx.user_id(), "Spare part deleted");
        Ok(())
    }

    /// Store a new image for the part and return the updated part
    pub async fn set_image(
        &self,
        ctx: &CallerContext,
        id: Uuid,
        extension: &str,
        bytes: &[u8],
    ) -> AppResult<Part> {
        validate_image_size(bytes.len(), self.max_image_bytes)?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let relative = format!("sparepart/{}", file_name);
        let dir = self.media_dir.join("sparepart");

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        let mut tx = self.db.begin().await?;

        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT image FROM spareparts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound(Entity::Part))?;

        write_then_record(
            &dir.join(&file_name),
            bytes,
            record_image(tx, ctx, id, &relative),
        )
        .await?;

        if let Some(previous) = previous {
            self.remove_file(&previous).await;
        }

        tracing::info!(part_id = %id, image = %relative, size = bytes.len(), "Spare part image stored");
        self.get(id, ctx.offset).await
    }

    async fn remove_file(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.media_dir.join(relative)).await {
            tracing::warn!(path = %relative, "Failed to remove stale image: {}", e);
        }
    }
}

async fn record_image(
    mut tx: Transaction<'static, Postgres>,
    ctx: &CallerContext,
    id: Uuid,
    relative: &str,
) -> AppResult<()> {
    sqlx::query("UPDATE spareparts SET image = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(relative)
        .bind(ctx.now)
        .execute(&mut *tx)
        .await?;

    AuditService::append(&mut tx, ctx, AuditTable::Sparepart, AuditOperation::Edit).await?;
    tx.commit().await?;
    Ok(())
}

/// Write `bytes` to `path`, then run `record`; the file is removed again
/// when `record` fails so no upload outlives its database row
async fn write_then_record<F>(path: &Path, bytes: &[u8], record: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| AppError::StorageError(e.to_string()))?;

    if let Err(e) = record.await {
        if let Err(rm) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), "Failed to remove orphaned image: {}", rm);
        }
        return Err(e);
    }
    Ok(())
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim)
}

/// File extension for an accepted image content type
pub fn image_extension(content_type: Option<&str>) -> Option<&'static str> {
    match content_type? {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(Some("image/png")), Some("png"));
        assert_eq!(image_extension(Some("image/jpeg")), Some("jpg"));
        assert_eq!(image_extension(Some("text/plain")), None);
        assert_eq!(image_extension(None), None);
    }

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bengkel-{}-{}", name, Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_image_kept_when_recorded() {
        let path = scratch_file("kept");
        write_then_record(&path, b"png", async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_image_removed_when_recording_fails() {
        let path = scratch_file("orphan");
        let result = write_then_record(&path, b"png", async {
            Err(AppError::Internal("commit failed".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(!path.exists());
    }
}
