//! Cart route handlers.
//!
//! Cart IDs are stored in the session and mapped to Shopify carts.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use reman_core::CartId;

use crate::middleware::session::keys;
use crate::shopify::types::Cart;
use crate::state::AppState;

/// Cart contents as returned by `GET /cart`.
///
/// `cart` is `None` when the visitor has no cart yet or it could not be
/// fetched.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart: Option<Cart>,
    pub item_count: i64,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cart: None,
            item_count: 0,
        }
    }
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            item_count: cart.total_quantity,
            cart: Some(cart),
        }
    }
}

/// Read the cart ID from the session.
pub(crate) async fn get_cart_id(session: &Session) -> Option<CartId> {
    match session.get::<String>(keys::CART_ID).await {
        Ok(id) => id.map(CartId::new),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart ID from session");
            None
        }
    }
}

/// Remember the cart ID in the session.
pub(crate) async fn set_cart_id(
    session: &Session,
    cart_id: &CartId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id.as_str()).await
}

/// Display the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartView> {
    let Some(cart_id) = get_cart_id(&session).await else {
        return Json(CartView::empty());
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => Json(CartView::from(cart)),
        Err(e) => {
            tracing::warn!(cart_id = %cart_id, error = %e, "Failed to fetch cart");
            Json(CartView::empty())
        }
    }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        return Redirect::to("/cart").into_response();
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => Redirect::to(&cart.checkout_url).into_response(),
        Err(e) => {
            tracing::error!(cart_id = %cart_id, error = %e, "Failed to get cart for checkout");
            Redirect::to("/cart").into_response()
        }
    }
}
