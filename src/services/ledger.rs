// src/services/ledger.rs

// In-memory arithmetic of the order and HPP commits. The services load and
// lock rows, then run every requested line through these types before
// writing anything, so the rules here are testable without a database.

use std::collections::HashMap;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use uuid::Uuid;

use crate::{common::error::AppError, models::catalog::Product};

/// A line that passed the stock check, with its frozen price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub qty: i32,
    pub unit_price: i64,
    pub subtotal: i64,
    /// Stock left on the product after this line.
    pub remaining_qty: i32,
}

#[derive(Debug, Clone)]
struct StockEntry {
    name: String,
    qty: i32,
    price: i64,
}

/// Snapshot of the locked products of one tenant. Each accepted line
/// decrements the snapshot, so repeated lines for one product see the
/// cumulative effect.
#[derive(Debug, Default)]
pub struct StockBook {
    entries: HashMap<Uuid, StockEntry>,
}

impl StockBook {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let entries = products
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    StockEntry {
                        name: p.name,
                        qty: p.qty,
                        price: p.price,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn take(&mut self, product_id: Uuid, qty: i32) -> Result<PricedLine, AppError> {
        if qty <= 0 {
            return Err(AppError::InvalidQuantity);
        }
        let entry = self
            .entries
            .get_mut(&product_id)
            .ok_or(AppError::ProductNotFound(product_id))?;

        if entry.qty < qty {
            return Err(AppError::InsufficientStock {
                product: entry.name.clone(),
                available: entry.qty,
                requested: qty,
            });
        }

        let subtotal = i64::from(qty)
            .checked_mul(entry.price)
            .ok_or_else(|| anyhow::anyhow!("order line subtotal overflows"))?;
        entry.qty -= qty;

        Ok(PricedLine {
            product_id,
            qty,
            unit_price: entry.price,
            subtotal,
            remaining_qty: entry.qty,
        })
    }
}

/// Running total of a commit. Emptiness is "no line applied", not
/// "total is zero": a line priced at zero still counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LedgerTally {
    total: i64,
    lines: usize,
}

impl LedgerTally {
    pub fn add(&mut self, subtotal: i64) -> Result<(), AppError> {
        self.total = self
            .total
            .checked_add(subtotal)
            .ok_or_else(|| anyhow::anyhow!("ledger total overflows"))?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// The final total, or `empty` when nothing was applied.
    pub fn finish(self, empty: AppError) -> Result<i64, AppError> {
        if self.lines == 0 {
            return Err(empty);
        }
        Ok(self.total)
    }
}

/// `trunc(qty * unit_price)` for ingredient lines.
pub fn cost_subtotal(qty: Decimal, unit_price: i64) -> Result<i64, AppError> {
    if qty <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity);
    }
    qty.checked_mul(Decimal::from(unit_price))
        .and_then(|v| v.trunc().to_i64())
        .ok_or_else(|| anyhow::anyhow!("cost line subtotal overflows").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn product(name: &str, qty: i32, price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            sku: format!("SKU-{name}"),
            name: name.to_string(),
            description: String::new(),
            qty,
            price,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn line_snapshots_price_and_decrements_stock() {
        let p = product("Kopi", 10, 1000);
        let id = p.id;
        let mut book = StockBook::new([p]);

        let line = book.take(id, 4).unwrap();
        assert_eq!(line.unit_price, 1000);
        assert_eq!(line.subtotal, 4000);
        assert_eq!(line.remaining_qty, 6);
    }

    #[test]
    fn repeated_lines_see_cumulative_stock() {
        let p = product("Teh", 5, 500);
        let id = p.id;
        let mut book = StockBook::new([p]);

        book.take(id, 3).unwrap();
        let err = book.take(id, 3).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock { available: 2, requested: 3, .. }
        ));
        assert_eq!(book.take(id, 2).unwrap().remaining_qty, 0);
    }

    #[test]
    fn unknown_product_and_bad_quantity() {
        let mut book = StockBook::new([product("Roti", 1, 1)]);
        let missing = Uuid::new_v4();
        assert!(matches!(book.take(missing, 1), Err(AppError::ProductNotFound(id)) if id == missing));

        let p = product("Susu", 3, 1);
        let id = p.id;
        let mut book = StockBook::new([p]);
        assert!(matches!(book.take(id, 0), Err(AppError::InvalidQuantity)));
        assert!(matches!(book.take(id, -2), Err(AppError::InvalidQuantity)));
    }

    #[test]
    fn zero_priced_lines_are_not_empty() {
        let p = product("Sample", 2, 0);
        let id = p.id;
        let mut book = StockBook::new([p]);
        let mut tally = LedgerTally::default();

        let line = book.take(id, 1).unwrap();
        tally.add(line.subtotal).unwrap();
        assert_eq!(tally.lines(), 1);
        assert_eq!(tally.finish(AppError::EmptyOrder).unwrap(), 0);
    }

    #[test]
    fn empty_tally_reports_the_given_error() {
        let tally = LedgerTally::default();
        assert!(matches!(
            tally.finish(AppError::EmptyCostRecord),
            Err(AppError::EmptyCostRecord)
        ));
    }

    #[test]
    fn total_sums_subtotals() {
        let mut tally = LedgerTally::default();
        for subtotal in [4000, 3750, 0, 250] {
            tally.add(subtotal).unwrap();
        }
        assert_eq!(tally.finish(AppError::EmptyOrder).unwrap(), 8000);
    }

    #[test]
    fn cost_subtotal_truncates() {
        assert_eq!(cost_subtotal(Decimal::from_str("2.5").unwrap(), 1500).unwrap(), 3750);
        assert_eq!(cost_subtotal(Decimal::from_str("0.33").unwrap(), 1000).unwrap(), 330);
        assert_eq!(cost_subtotal(Decimal::from_str("0.01").unwrap(), 99).unwrap(), 0);
        assert_eq!(cost_subtotal(Decimal::from_str("1.99").unwrap(), 3).unwrap(), 5);
    }

    #[test]
    fn cost_subtotal_rejects_non_positive_qty() {
        assert!(matches!(cost_subtotal(Decimal::ZERO, 100), Err(AppError::InvalidQuantity)));
        assert!(matches!(
            cost_subtotal(Decimal::from_str("-1").unwrap(), 100),
            Err(AppError::InvalidQuantity)
        ));
    }
}
