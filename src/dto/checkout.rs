use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Order, Payment};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
}

#[derive(Debug, Clone, Default, Validate, PartialEq, Eq)]
pub struct ShippingInfo {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
}

/// Bank-transfer sub-fields; all optional, filled on the payment-details step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankTransferDetails {
    pub bank_code: Option<String>,
    pub transaction_code: Option<String>,
    pub proof_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckoutRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_image: Option<String>,
}

/// What the receipt view renders after a successful submission.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OrderConfirmation {
    pub order: Order,
    pub payment: Payment,
}
