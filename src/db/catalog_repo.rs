// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{is_check_violation, is_foreign_key_violation, is_unique_violation},
        error::AppError,
    },
    models::catalog::{Category, Product, ProductAttrs, StockMovement, StockMovementReason},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Categories
    // ---

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: &str,
        created_by: Uuid,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (tenant_id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "categories_tenant_name_key") {
                AppError::CategoryNameAlreadyExists(name.to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn category_exists<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(category_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $3, description = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(category_id)
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "categories_tenant_name_key") {
                AppError::CategoryNameAlreadyExists(name.to_string())
            } else {
                e.into()
            }
        })?
        .ok_or(AppError::NotFound("category"))
    }

    pub async fn delete_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND tenant_id = $2")
            .bind(category_id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e, "order_items_product_id_fkey") {
                    AppError::ProductHasOrders
                } else {
                    e.into()
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("category"));
        }
        Ok(())
    }

    // ---
    // Products
    // ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        attrs: &ProductAttrs,
        initial_qty: i32,
        created_by: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, category_id, sku, name, description, qty, price, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(attrs.category_id)
        .bind(&attrs.sku)
        .bind(&attrs.name)
        .bind(&attrs.description)
        .bind(initial_qty)
        .bind(attrs.price)
        .bind(attrs.is_active)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "products_tenant_sku_key") {
                AppError::SkuAlreadyExists(attrs.sku.clone())
            } else {
                e.into()
            }
        })
    }

    /// Products of a tenant. With `orderable_only`, just the active ones
    /// that still have stock.
    pub async fn list_products(
        &self,
        tenant_id: Uuid,
        orderable_only: bool,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = $1
              AND (NOT $2 OR (is_active AND qty > 0))
            ORDER BY name
            "#,
        )
        .bind(tenant_id)
        .bind(orderable_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND tenant_id = $2",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Row-locks one product for a stock adjustment.
    pub async fn find_product_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Row-locks every listed product of the tenant in ascending id order,
    /// so two orders touching the same products always lock them in the
    /// same sequence. Ids from other tenants are simply not returned.
    pub async fn lock_products_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = $1 AND id = ANY($2)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .bind(product_ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        attrs: &ProductAttrs,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET category_id = $3, sku = $4, name = $5, description = $6,
                price = $7, is_active = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(attrs.category_id)
        .bind(&attrs.sku)
        .bind(&attrs.name)
        .bind(&attrs.description)
        .bind(attrs.price)
        .bind(attrs.is_active)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "products_tenant_sku_key") {
                AppError::SkuAlreadyExists(attrs.sku.clone())
            } else {
                e.into()
            }
        })?
        .ok_or(AppError::NotFound("product"))
    }

    pub async fn delete_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND tenant_id = $2")
            .bind(product_id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e, "order_items_product_id_fkey") {
                    AppError::ProductHasOrders
                } else {
                    e.into()
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("product"));
        }
        Ok(())
    }

    // ---
    // Stock
    // ---

    /// Writes an absolute quantity. The `qty >= 0` CHECK is the last line
    /// of defence and surfaces as `InsufficientStock`.
    pub async fn set_qty<'e, E>(
        &self,
        executor: E,
        product: &Product,
        new_qty: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET qty = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(new_qty)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_check_violation(&e, "products_qty_non_negative") {
                AppError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.qty,
                    requested: product.qty.saturating_sub(new_qty),
                }
            } else {
                e.into()
            }
        })
    }

    /// Decrements stock only when enough is left. Returns the new quantity,
    /// or `None` when the product did not have `qty` units.
    pub async fn decrement_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        qty: i32,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products SET qty = qty - $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND qty >= $3
            RETURNING qty
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(qty)
        .fetch_optional(executor)
        .await?;
        Ok(remaining)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record_stock_movement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        quantity_changed: i32,
        resulting_qty: i32,
        reason: StockMovementReason,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements
                (tenant_id, product_id, quantity_changed, resulting_qty, reason, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(quantity_changed)
        .bind(resulting_qty)
        .bind(reason)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn list_stock_movements(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE tenant_id = $1 AND product_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }
}
