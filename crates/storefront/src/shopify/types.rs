//! Domain types for Shopify Storefront API carts and money.
//!
//! Product types live in `reman_core::catalog`; these are the remaining
//! shapes the storefront hands to routes, kept separate from the raw wire
//! types in [`super::storefront::queries`].

use serde::{Deserialize, Serialize};

use reman_core::{CartId, PlannedLine, Price, PriceError, VariantId};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code, as Shopify sends it.
///
/// Accepts both the GraphQL `MoneyV2` shape (`currencyCode`) and the money
/// metafield JSON shape (`currency_code`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    #[serde(rename = "currencyCode", alias = "currency_code")]
    pub currency_code: String,
}

impl Money {
    /// Parse into a decimal price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the amount or currency is invalid.
    pub fn to_price(&self) -> Result<Price, PriceError> {
        Price::parse(&self.amount, &self.currency_code)
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Merchandise (product variant) in a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartMerchandise {
    pub id: VariantId,
    pub title: String,
    pub product_title: String,
    pub product_handle: String,
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: String,
    pub quantity: i64,
    pub merchandise: CartMerchandise,
    /// Total for this line (unit price times quantity).
    pub total: Price,
}

/// Cart cost summary.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCost {
    pub subtotal: Price,
    pub total: Price,
}

/// A Shopify cart.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    /// URL to Shopify checkout.
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCost,
    pub lines: Vec<CartLine>,
}

/// Input for adding a line to the cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

impl From<PlannedLine> for CartLineInput {
    fn from(line: PlannedLine) -> Self {
        Self {
            merchandise_id: line.merchandise_id.into(),
            quantity: i64::from(line.quantity),
        }
    }
}

/// User error from cart mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct CartUserError {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_money_accepts_metafield_shape() {
        let money: Money =
            serde_json::from_str(r#"{"amount":"199.0","currency_code":"USD"}"#).unwrap();
        assert_eq!(money.to_price().unwrap().amount, Decimal::from(199));

        let money: Money =
            serde_json::from_str(r#"{"amount":"5.50","currencyCode":"CAD"}"#).unwrap();
        assert_eq!(money.to_price().unwrap().display(), "$5.50");
    }

    #[test]
    fn test_cart_line_input_serializes_camel_case() {
        let input = CartLineInput::from(PlannedLine {
            merchandise_id: VariantId::new("gid://shopify/ProductVariant/1"),
            quantity: 1,
        });
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["merchandiseId"], "gid://shopify/ProductVariant/1");
        assert_eq!(json["quantity"], 1);
    }
}
