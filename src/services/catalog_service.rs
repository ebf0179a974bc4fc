// src/services/catalog_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::{
        auth::{Capability, User},
        catalog::{
            Category, Product, ProductAttrs, StockAdjustmentMode, StockMovement,
            StockMovementReason,
        },
    },
    services::access::AccessGuard,
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
    access: AccessGuard,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository, access: AccessGuard) -> Self {
        Self { catalog_repo, access }
    }

    // --- CATEGORIES ---

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        let category = self
            .catalog_repo
            .create_category(&mut *tx, tenant_id, name, description, actor.id)
            .await?;
        tx.commit().await?;
        Ok(category)
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
    ) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        self.catalog_repo.list_categories(tenant_id).await
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        category_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        let category = self
            .catalog_repo
            .update_category(&mut *tx, tenant_id, category_id, name, description)
            .await?;
        tx.commit().await?;
        Ok(category)
    }

    // Products of the category go with it.
    pub async fn delete_category<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        self.catalog_repo
            .delete_category(&mut *tx, tenant_id, category_id)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // --- PRODUCTS ---

    /// Creates a product. A positive initial stock is recorded as an
    /// `INITIAL_STOCK` movement in the same transaction.
    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        attrs: &ProductAttrs,
        initial_qty: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if initial_qty < 0 {
            return Err(AppError::InvalidQuantity);
        }

        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;

        if !self
            .catalog_repo
            .category_exists(&mut *tx, tenant_id, attrs.category_id)
            .await?
        {
            return Err(AppError::NotFound("category"));
        }

        let product = self
            .catalog_repo
            .create_product(&mut *tx, tenant_id, attrs, initial_qty, actor.id)
            .await?;

        if initial_qty > 0 {
            self.catalog_repo
                .record_stock_movement(
                    &mut *tx,
                    tenant_id,
                    product.id,
                    initial_qty,
                    initial_qty,
                    StockMovementReason::InitialStock,
                    None,
                    actor.id,
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(product_id = %product.id, %tenant_id, sku = %product.sku, "product created");
        Ok(product)
    }

    /// All products, or with `orderable_only` the active ones in stock.
    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        orderable_only: bool,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // the order form needs the orderable list, so crew and owners
        // recording orders may read it as well
        let capability = if orderable_only {
            Capability::RecordOrders
        } else {
            Capability::ManageCatalog
        };
        self.access
            .require_tenant(executor, actor, tenant_id, capability)
            .await?;
        self.catalog_repo.list_products(tenant_id, orderable_only).await
    }

    pub async fn get_product<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        let product = self
            .catalog_repo
            .find_product(&mut *tx, tenant_id, product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;
        tx.commit().await?;
        Ok(product)
    }

    // Quantity is not an editable attribute; see adjust_stock.
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        product_id: Uuid,
        attrs: &ProductAttrs,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;

        if !self
            .catalog_repo
            .category_exists(&mut *tx, tenant_id, attrs.category_id)
            .await?
        {
            return Err(AppError::NotFound("category"));
        }

        let product = self
            .catalog_repo
            .update_product(&mut *tx, tenant_id, product_id, attrs)
            .await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn delete_product<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        self.catalog_repo
            .delete_product(&mut *tx, tenant_id, product_id)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // --- STOCK ---

    /// Adds to, reduces or sets the stock of one product, under a row
    /// lock, and appends the matching movement.
    #[allow(clippy::too_many_arguments)]
    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        product_id: Uuid,
        mode: StockAdjustmentMode,
        amount: i32,
        notes: Option<&str>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCatalog)
            .await?;

        // 1. Lock the product row
        let product = self
            .catalog_repo
            .find_product_for_update(&mut *tx, tenant_id, product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

        // 2. Compute the new quantity
        let new_qty = match mode.apply(product.qty, amount) {
            Some(qty) => qty,
            None if mode == StockAdjustmentMode::Reduce && amount >= 0 => {
                tracing::warn!(%product_id, available = product.qty, requested = amount, "stock reduction refused");
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.qty,
                    requested: amount,
                });
            }
            None => return Err(AppError::InvalidQuantity),
        };

        // 3. Persist and record the movement
        let updated = self.catalog_repo.set_qty(&mut *tx, &product, new_qty).await?;
        self.catalog_repo
            .record_stock_movement(
                &mut *tx,
                tenant_id,
                product.id,
                new_qty - product.qty,
                new_qty,
                mode.reason(),
                notes,
                actor.id,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%product_id, from = product.qty, to = new_qty, ?mode, "stock adjusted");
        Ok(updated)
    }

    pub async fn stock_history<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::ManageCatalog)
            .await?;
        self.catalog_repo.list_stock_movements(tenant_id, product_id).await
    }
}
