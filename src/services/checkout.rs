use validator::Validate;

use crate::dto::checkout::{
    BankTransferDetails, CheckoutRequest, OrderConfirmation, OrderItemInput, PaymentMethod,
    ShippingInfo,
};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::services::cart::CartStore;

/// A bank the customer can transfer to, with the QR image shown on the
/// payment-details step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankAccount {
    pub code: &'static str,
    pub name: &'static str,
    pub account_number: &'static str,
    pub account_name: &'static str,
    pub qr_image: &'static str,
}

pub const BANKS: &[BankAccount] = &[
    BankAccount {
        code: "vcb",
        name: "Vietcombank",
        account_number: "0071000123456",
        account_name: "STOREFRONT CO LTD",
        qr_image: "/static/banks/vcb-qr.png",
    },
    BankAccount {
        code: "tcb",
        name: "Techcombank",
        account_number: "19033512345678",
        account_name: "STOREFRONT CO LTD",
        qr_image: "/static/banks/tcb-qr.png",
    },
    BankAccount {
        code: "mb",
        name: "MB Bank",
        account_number: "0912345678901",
        account_name: "STOREFRONT CO LTD",
        qr_image: "/static/banks/mb-qr.png",
    },
];

pub fn find_bank(code: &str) -> Option<&'static BankAccount> {
    BANKS.iter().find(|bank| bank.code == code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    ShippingInfo,
    PaymentDetails,
}

/// Two-step checkout wizard over the current cart.
///
/// Cash-on-delivery submits straight from the shipping step; bank transfer
/// visits the payment-details step first. Field state survives back
/// navigation, and nothing but a successful submission touches the cart.
#[derive(Debug)]
pub struct CheckoutFlow {
    api: ApiClient,
    step: CheckoutStep,
    shipping: Option<ShippingInfo>,
    method: Option<PaymentMethod>,
    bank: BankTransferDetails,
}

impl CheckoutFlow {
    /// Enter checkout. Rejected up front when the cart is empty.
    pub fn begin(api: ApiClient, cart_store: &CartStore) -> ClientResult<Self> {
        if cart_store.current().is_none_or(|cart| cart.is_empty()) {
            return Err(ClientError::EmptyCart);
        }
        Ok(Self {
            api,
            step: CheckoutStep::ShippingInfo,
            shipping: None,
            method: None,
            bank: BankTransferDetails::default(),
        })
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn shipping(&self) -> Option<&ShippingInfo> {
        self.shipping.as_ref()
    }

    pub fn bank_details(&self) -> &BankTransferDetails {
        &self.bank
    }

    /// Record shipping fields and the payment method, advancing to the
    /// payment-details step for bank transfer. Returns the step the flow is
    /// now on; for `Cod` it stays on `ShippingInfo`, ready to submit.
    pub fn submit_shipping(
        &mut self,
        shipping: ShippingInfo,
        method: PaymentMethod,
    ) -> ClientResult<CheckoutStep> {
        shipping.validate()?;
        self.shipping = Some(shipping);
        self.method = Some(method.clone());
        self.step = match method {
            PaymentMethod::BankTransfer => CheckoutStep::PaymentDetails,
            PaymentMethod::Cod => CheckoutStep::ShippingInfo,
        };
        Ok(self.step)
    }

    /// Return from payment details to the shipping step; entered fields stay.
    pub fn back(&mut self) {
        self.step = CheckoutStep::ShippingInfo;
    }

    pub fn set_bank_details(&mut self, details: BankTransferDetails) -> ClientResult<()> {
        if let Some(code) = &details.bank_code {
            if find_bank(code).is_none() {
                return Err(ClientError::InvalidInput(format!("unknown bank: {code}")));
            }
        }
        self.bank = details;
        Ok(())
    }

    /// Submit the order once. On success the cart is cleared and the server's
    /// order/payment pair is handed back for the receipt view. On any failure
    /// the flow keeps its pre-submission state so the user can correct and
    /// resubmit; there is no automatic retry.
    pub async fn submit(&self, cart_store: &CartStore) -> ClientResult<OrderConfirmation> {
        let cart = cart_store.current().ok_or(ClientError::EmptyCart)?;
        if cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        if self.api.session().credential().is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        let shipping = self
            .shipping
            .as_ref()
            .ok_or_else(|| ClientError::InvalidInput("shipping info is incomplete".into()))?;
        let method = self
            .method
            .clone()
            .ok_or_else(|| ClientError::InvalidInput("payment method not selected".into()))?;

        let bank = match method {
            PaymentMethod::BankTransfer => self.bank.clone(),
            PaymentMethod::Cod => BankTransferDetails::default(),
        };
        let request = CheckoutRequest {
            name: shipping.name.clone(),
            phone: shipping.phone.clone(),
            address: shipping.address.clone(),
            payment_method: method,
            items: cart
                .items
                .iter()
                .map(|item| OrderItemInput {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            bank_code: bank.bank_code,
            transaction_code: bank.transaction_code,
            proof_image: bank.proof_image,
        };

        let confirmation = self
            .api
            .post_json::<OrderConfirmation, _>("/checkout/", &request)
            .await?;

        if let Err(err) = cart_store.clear().await {
            // The order is already placed; a stale local cart is the lesser
            // problem and the next refresh resolves it.
            tracing::warn!(error = %err, "failed to clear cart after checkout");
        }
        tracing::info!(order_id = %confirmation.order.id, "order placed");
        Ok(confirmation)
    }
}
