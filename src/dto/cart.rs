use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}
