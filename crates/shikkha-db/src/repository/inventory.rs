//! # Inventory Repository
//!
//! Stock items and their movement log. Every quantity change writes a
//! `stock_movements` row with the resulting balance in the same transaction.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::inventory::{apply_movement, InventoryItem, ItemUpdate, NewItem, NewMovement, StockMovement};
use shikkha_core::Page;

const ITEM_COLUMNS: &str = r#"
    id, school_id, name, category, unit, quantity, min_quantity, unit_price_paisa,
    location, created_at, updated_at
"#;

const MOVEMENT_COLUMNS: &str = r#"
    id, school_id, item_id, kind, quantity, balance_after, note, created_by, created_at
"#;

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        InventoryRepository { pool }
    }

    pub async fn get_item(&self, school_id: &str, id: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Items by name, optionally one category.
    pub async fn list_items(&self, school_id: &str, category: Option<&str>, page: Page) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM inventory_items
            WHERE school_id = $1 AND ($2::text IS NULL OR category = $2)
            ORDER BY name, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(school_id)
        .bind(category)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items at or below their reorder level.
    pub async fn low_stock(&self, school_id: &str) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM inventory_items
            WHERE school_id = $1 AND quantity <= min_quantity
            ORDER BY quantity - min_quantity, name
            "#
        ))
        .bind(school_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Creates an item. An opening quantity is logged as an `in` movement.
    pub async fn create_item(
        &self,
        school_id: &str,
        new: &NewItem,
        created_by: Option<&str>,
    ) -> DbResult<InventoryItem> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            INSERT INTO inventory_items (id, school_id, name, category, unit, quantity, min_quantity, unit_price_paisa, location)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'pcs'), $6, $7, $8, $9)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(new.name.trim())
        .bind(&new.category)
        .bind(new.unit.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(new.quantity)
        .bind(new.min_quantity)
        .bind(new.unit_price_paisa)
        .bind(&new.location)
        .fetch_one(&mut *tx)
        .await?;

        if item.quantity > 0 {
            sqlx::query(
                r#"
                INSERT INTO stock_movements (id, school_id, item_id, kind, quantity, balance_after, note, created_by)
                VALUES ($1, $2, $3, 'in', $4, $4, 'opening stock', $5)
                "#,
            )
            .bind(new_id())
            .bind(school_id)
            .bind(&item.id)
            .bind(item.quantity)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(school_id = %school_id, item_id = %item.id, quantity = item.quantity, "Inventory item created");
        Ok(item)
    }

    /// Updates descriptive fields. Quantity changes go through [`Self::record_movement`].
    pub async fn update_item(&self, school_id: &str, id: &str, update: &ItemUpdate) -> DbResult<InventoryItem> {
        update.validate()?;

        sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            UPDATE inventory_items SET
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                unit = COALESCE($5, unit),
                min_quantity = COALESCE($6, min_quantity),
                unit_price_paisa = COALESCE($7, unit_price_paisa),
                location = COALESCE($8, location),
                updated_at = now()
            WHERE school_id = $1 AND id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.category)
        .bind(&update.unit)
        .bind(update.min_quantity)
        .bind(update.unit_price_paisa)
        .bind(&update.location)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Inventory item", id))
    }

    pub async fn delete_item(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }
        info!(school_id = %school_id, item_id = %id, "Inventory item deleted");
        Ok(())
    }

    /// Applies a stock movement and logs it.
    ///
    /// ## Errors
    /// - `CoreError::InsufficientStock` when an `out` exceeds the quantity on hand
    /// - `DbError::NotFound` for an unknown item
    pub async fn record_movement(
        &self,
        school_id: &str,
        item_id: &str,
        movement: &NewMovement,
        created_by: Option<&str>,
    ) -> DbResult<StockMovement> {
        movement.validate()?;

        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE school_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(school_id)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Inventory item", item_id))?;

        let balance = apply_movement(&item.name, item.quantity, movement.kind, movement.quantity)?;

        sqlx::query("UPDATE inventory_items SET quantity = $2, updated_at = now() WHERE id = $1")
            .bind(item_id)
            .bind(balance)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            INSERT INTO stock_movements (id, school_id, item_id, kind, quantity, balance_after, note, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(item_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(balance)
        .bind(&movement.note)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            school_id = %school_id,
            item_id = %item_id,
            kind = ?movement.kind,
            quantity = movement.quantity,
            balance_after = balance,
            "Stock movement recorded"
        );
        if balance <= item.min_quantity {
            warn!(item_id = %item_id, balance, min = item.min_quantity, "Item at or below reorder level");
        }
        Ok(row)
    }

    /// Movement log of one item, newest first.
    pub async fn movements(&self, school_id: &str, item_id: &str, page: Page) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE school_id = $1 AND item_id = $2
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(school_id)
        .bind(item_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
