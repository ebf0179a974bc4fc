// src/models/orders.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Budi")]
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    #[schema(example = 72000)]
    pub total_amount: i64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Line item. `unit_price` is frozen at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = 4)]
    pub qty: i32,
    #[schema(example = 18000)]
    pub unit_price: i64,
    #[schema(example = 72000)]
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}

// Line item joined with the product name and sku for display.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: String,
    pub product_sku: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub total_qty: i64,
    pub items: Vec<OrderItemView>,
}

// What a successful commit returns: the header and the lines as written.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Customer metadata captured on the order. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerInfo {
    // Blank strings from forms are stored as NULL.
    pub fn normalized(&self) -> CustomerInfo {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        CustomerInfo {
            name: clean(&self.name),
            phone: clean(&self.phone),
            address: clean(&self.address),
        }
    }
}

/// One requested line: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub qty: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_customer_fields_become_none() {
        let info = CustomerInfo {
            name: Some("  Siti ".into()),
            phone: Some("   ".into()),
            address: None,
        };
        let n = info.normalized();
        assert_eq!(n.name.as_deref(), Some("Siti"));
        assert_eq!(n.phone, None);
        assert_eq!(n.address, None);
    }
}
