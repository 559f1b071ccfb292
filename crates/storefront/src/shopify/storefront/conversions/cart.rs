//! Cart type conversion functions.

use reman_core::{CartId, VariantId};

use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartCost, CartLine, CartMerchandise, CartUserError};

use super::super::queries::{MoneyV2, cart_fields};

fn price(money: &MoneyV2) -> Result<reman_core::Price, ShopifyError> {
    reman_core::Price::parse(&money.amount, &money.currency_code)
        .map_err(|e| ShopifyError::InvalidData(e.to_string()))
}

fn convert_line(line: cart_fields::CartLine) -> Result<CartLine, ShopifyError> {
    Ok(CartLine {
        total: price(&line.cost.total_amount)?,
        id: line.id,
        quantity: line.quantity,
        merchandise: CartMerchandise {
            id: VariantId::new(line.merchandise.id),
            title: line.merchandise.title,
            product_title: line.merchandise.product.title,
            product_handle: line.merchandise.product.handle,
        },
    })
}

/// Convert the shared cart selection.
///
/// # Errors
///
/// Returns `ShopifyError::InvalidData` when an amount cannot be parsed.
pub fn convert_cart(cart: cart_fields::Cart) -> Result<Cart, ShopifyError> {
    Ok(Cart {
        cost: CartCost {
            subtotal: price(&cart.cost.subtotal_amount)?,
            total: price(&cart.cost.total_amount)?,
        },
        lines: cart
            .lines
            .into_nodes()
            .map(convert_line)
            .collect::<Result<Vec<_>, _>>()?,
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
    })
}

/// Convert mutation user errors.
pub fn convert_user_errors(errors: Vec<cart_fields::UserError>) -> Vec<CartUserError> {
    errors
        .into_iter()
        .map(|e| CartUserError {
            code: e.code,
            field: e.field,
            message: e.message,
        })
        .collect()
}
