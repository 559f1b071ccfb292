//! Account route handlers.
//!
//! These routes sit behind [`crate::middleware::ensure_logged_in`], which
//! supplies the [`CustomerToken`].

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::{Result, set_sentry_user};
use crate::middleware::CustomerToken;
use crate::shopify::{Customer, Order};
use crate::state::AppState;

/// How many recent orders the order history shows.
const RECENT_ORDERS: i64 = 20;

/// Account overview.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub name: String,
    pub email: Option<String>,
    pub tags: Vec<String>,
}

impl From<Customer> for AccountView {
    fn from(customer: Customer) -> Self {
        Self {
            name: customer.full_name(),
            email: customer.email,
            tags: customer.tags,
        }
    }
}

/// Order history.
#[derive(Debug, Serialize)]
pub struct OrdersView {
    pub orders: Vec<Order>,
}

/// Display the customer profile.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    CustomerToken(token): CustomerToken,
) -> Result<Json<AccountView>> {
    let customer = state.customer().get_customer(&token).await?;
    if let Some(email) = customer.email.as_deref() {
        set_sentry_user(&email, Some(email));
    }
    Ok(Json(AccountView::from(customer)))
}

/// Display recent orders, newest first.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    CustomerToken(token): CustomerToken,
) -> Result<Json<OrdersView>> {
    let orders = state.customer().get_orders(&token, RECENT_ORDERS).await?;
    Ok(Json(OrdersView { orders }))
}
