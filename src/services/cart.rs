use std::sync::Mutex;

use uuid::Uuid;

use crate::dto::cart::AddItemRequest;
use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::models::{Cart, Product};

#[derive(Debug, Clone, Default)]
pub struct CartState {
    pub cart: Option<Cart>,
    pub loading: bool,
    pub last_error: Option<String>,
}

/// Client cache of the server-held cart for the current session.
///
/// Every successful operation replaces the local cart wholesale with the
/// server's response; there is no optimistic mutation of quantities or totals.
/// Mutating calls are serialized through one lock so a slow response can never
/// overwrite the result of a later call.
#[derive(Debug)]
pub struct CartStore {
    api: ApiClient,
    state: Mutex<CartState>,
    mutation: tokio::sync::Mutex<()>,
}

impl CartStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Mutex::new(CartState::default()),
            mutation: tokio::sync::Mutex::new(()),
        }
    }

    /// Ensure a session id exists, then load the cart for it.
    pub async fn initialize(&self) -> ClientResult<()> {
        self.api.session().session_id()?;
        self.refresh().await
    }

    /// Fetch the cart and replace local state. Failure is non-fatal: the
    /// previous cart is retained and `last_error` records the message for a
    /// retry affordance.
    pub async fn refresh(&self) -> ClientResult<()> {
        let session_id = self.api.session().session_id()?;
        self.set_loading(true);
        let result = self
            .api
            .get_json::<Cart>(&format!("/cart/{session_id}"), &[])
            .await;
        match result {
            Ok(cart) => {
                self.replace(Some(cart));
                Ok(())
            }
            Err(err) => {
                let mut state = self.lock_state();
                state.loading = false;
                state.last_error = Some(err.user_message());
                tracing::warn!(error = %err, "cart refresh failed");
                Err(err)
            }
        }
    }

    pub async fn add_item(&self, product: &Product, quantity: i32) -> ClientResult<()> {
        let session_id = self.api.session().session_id()?;
        let _serialized = self.mutation.lock().await;
        let cart = self
            .api
            .post_json::<Cart, _>(
                &format!("/cart/{session_id}/items"),
                &AddItemRequest {
                    product_id: product.id,
                    quantity,
                    price: product.price,
                },
            )
            .await?;
        self.replace(Some(cart));
        Ok(())
    }

    /// No-op when `quantity < 1`; line items never drop below one unit.
    pub async fn update_quantity(&self, item_id: Uuid, quantity: i32) -> ClientResult<()> {
        if quantity < 1 {
            return Ok(());
        }
        let session_id = self.api.session().session_id()?;
        let _serialized = self.mutation.lock().await;
        let cart = self
            .api
            .put_json::<Cart>(
                &format!("/cart/{session_id}/items/{item_id}"),
                &[("quantity", quantity.to_string())],
            )
            .await?;
        self.replace(Some(cart));
        Ok(())
    }

    pub async fn remove_item(&self, item_id: Uuid) -> ClientResult<()> {
        let session_id = self.api.session().session_id()?;
        let _serialized = self.mutation.lock().await;
        let cart = self
            .api
            .delete_json::<Cart>(&format!("/cart/{session_id}/items/{item_id}"))
            .await?;
        self.replace(Some(cart));
        Ok(())
    }

    pub async fn clear(&self) -> ClientResult<()> {
        let session_id = self.api.session().session_id()?;
        let _serialized = self.mutation.lock().await;
        self.api.delete(&format!("/cart/{session_id}")).await?;
        self.replace(None);
        Ok(())
    }

    pub fn current(&self) -> Option<Cart> {
        self.lock_state().cart.clone()
    }

    pub fn state(&self) -> CartState {
        self.lock_state().clone()
    }

    fn replace(&self, cart: Option<Cart>) {
        let mut state = self.lock_state();
        state.cart = cart;
        state.loading = false;
        state.last_error = None;
    }

    fn set_loading(&self, loading: bool) {
        self.lock_state().loading = loading;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
