// src/services/order_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, OrderRepository},
    models::{
        auth::{Capability, User},
        catalog::StockMovementReason,
        orders::{CustomerInfo, Order, OrderDetail, OrderLineRequest, OrderReceipt},
    },
    services::{
        access::{require_capability, AccessGuard},
        ledger::{LedgerTally, StockBook},
    },
};

/// Distinct product ids of the request, ascending. Rows are locked in
/// this sequence.
pub fn lock_order(lines: &[OrderLineRequest]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    catalog_repo: CatalogRepository,
    access: AccessGuard,
}

impl OrderService {
    pub fn new(order_repo: OrderRepository, catalog_repo: CatalogRepository, access: AccessGuard) -> Self {
        Self {
            order_repo,
            catalog_repo,
            access,
        }
    }

    /// Records an order and takes its quantities out of stock, all or
    /// nothing. Lines are applied in request order; a failure on any line
    /// rolls back the header, earlier lines and their stock decrements.
    pub async fn commit_order<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        customer: &CustomerInfo,
        lines: &[OrderLineRequest],
    ) -> Result<OrderReceipt, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        require_capability(actor, Capability::RecordOrders)?;
        if lines.iter().any(|l| l.qty <= 0) {
            return Err(AppError::InvalidQuantity);
        }

        let mut tx = executor.begin().await?;

        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::RecordOrders)
            .await?;

        // 1. Lock every product the order touches, lowest id first
        let products = self
            .catalog_repo
            .lock_products_for_update(&mut *tx, tenant_id, &lock_order(lines))
            .await?;
        let mut book = StockBook::new(products);

        // 2. Header with a zero total
        let order = self
            .order_repo
            .create_order(&mut *tx, tenant_id, &customer.normalized(), actor.id)
            .await?;

        // 3. Lines
        let movement_note = format!("order {}", order.id);
        let mut tally = LedgerTally::default();
        let mut items = Vec::with_capacity(lines.len());
        for request in lines {
            let line = book.take(request.product_id, request.qty).inspect_err(|e| {
                tracing::warn!(%tenant_id, product_id = %request.product_id, "order line rejected: {}", e);
            })?;

            let item = self.order_repo.add_item(&mut *tx, order.id, &line).await?;

            let remaining = self
                .catalog_repo
                .decrement_stock(&mut *tx, tenant_id, line.product_id, line.qty)
                .await?
                .ok_or_else(|| AppError::InsufficientStock {
                    product: line.product_id.to_string(),
                    available: line.remaining_qty + line.qty,
                    requested: line.qty,
                })?;

            self.catalog_repo
                .record_stock_movement(
                    &mut *tx,
                    tenant_id,
                    line.product_id,
                    -line.qty,
                    remaining,
                    StockMovementReason::Sale,
                    Some(movement_note.as_str()),
                    actor.id,
                )
                .await?;

            tally.add(line.subtotal)?;
            items.push(item);
        }

        // 4. Total, written once
        let total = tally.finish(AppError::EmptyOrder)?;
        let order = self.order_repo.set_total(&mut *tx, order.id, total).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            %tenant_id,
            lines = items.len(),
            total = order.total_amount,
            "order committed"
        );
        Ok(OrderReceipt { order, items })
    }

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::RecordOrders)
            .await?;
        self.order_repo.list_orders(tenant_id).await
    }

    pub async fn order_detail<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::RecordOrders)
            .await?;

        let header = self
            .order_repo
            .find_order(tenant_id, order_id)
            .await?
            .ok_or(AppError::NotFound("order"))?;
        let items = self.order_repo.list_items(order_id).await?;
        let total_qty = items.iter().map(|i| i64::from(i.item.qty)).sum();

        Ok(OrderDetail {
            header,
            total_qty,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_is_sorted_and_distinct() {
        let a = Uuid::from_u128(3);
        let b = Uuid::from_u128(1);
        let lines = [
            OrderLineRequest { product_id: a, qty: 1 },
            OrderLineRequest { product_id: b, qty: 2 },
            OrderLineRequest { product_id: a, qty: 5 },
        ];
        assert_eq!(lock_order(&lines), vec![b, a]);
    }
}
