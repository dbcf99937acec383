use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub image: Option<String>,
    pub product_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

/// Server-owned cart aggregate. Every derived field below is computed by the
/// backend and adopted verbatim; the client never does its own arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub id: Uuid,
    pub session_id: String,
    pub items: Vec<CartItem>,
    pub subtotal: i64,
    pub tax: i64,
    pub shipping_fee: i64,
    pub discount: i64,
    pub total: i64,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Option<i64>,
    pub invoice_number: String,
    pub status: String,
    pub total_amount: i64,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: String,
    pub status: String,
    pub amount: i64,
    pub bank_code: Option<String>,
    pub transaction_code: Option<String>,
    pub proof_image: Option<String>,
}
