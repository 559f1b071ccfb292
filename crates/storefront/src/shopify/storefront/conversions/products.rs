//! Product type conversion functions.
//!
//! Maps the wire product onto `reman_core::Product`, parsing the reman
//! metafields. A metafield that fails to parse is logged and treated as
//! absent so one bad value does not take the product page down.

use tracing::warn;

use reman_core::{
    AddOn, Price, Product, ProductId, ProductOption, SelectedOption, Variant, VariantId,
};

use crate::shopify::ShopifyError;
use crate::shopify::types::Money;

use super::super::queries::{Metafield, MoneyV2, get_product_by_handle};

fn convert_money(money: &MoneyV2) -> Result<Price, ShopifyError> {
    Price::parse(&money.amount, &money.currency_code)
        .map_err(|e| ShopifyError::InvalidData(e.to_string()))
}

/// Non-empty metafield text.
fn text(field: Option<Metafield>) -> Option<String> {
    field.map(|m| m.value).filter(|v| !v.trim().is_empty())
}

/// Money metafield, stored as JSON (`{"amount":"199.0","currency_code":"USD"}`).
fn parse_core_charge(variant_id: &str, field: Option<Metafield>) -> Option<Price> {
    let raw = text(field)?;
    match serde_json::from_str::<Money>(&raw).map(|m| m.to_price()) {
        Ok(Ok(price)) => Some(price),
        Ok(Err(e)) => {
            warn!(variant_id, error = %e, "Invalid core charge amount");
            None
        }
        Err(e) => {
            warn!(variant_id, error = %e, "Core charge metafield is not money JSON");
            None
        }
    }
}

/// Boolean metafield, stored as JSON (`true`/`false`).
fn parse_flag(field: Option<Metafield>) -> bool {
    text(field)
        .and_then(|raw| serde_json::from_str::<bool>(raw.trim()).ok())
        .unwrap_or(false)
}

fn parse_add_on(
    variant_id: &str,
    product: Option<Metafield>,
    quantity: Option<Metafield>,
) -> Option<AddOn> {
    let product = text(product)?;
    let quantity = match text(quantity) {
        None => 1,
        Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
            warn!(variant_id, raw = %raw, "Invalid add-on quantity, defaulting to 1");
            1
        }),
    };
    Some(AddOn {
        variant_id: VariantId::new(product),
        quantity,
    })
}

fn convert_variant(v: get_product_by_handle::Variant) -> Result<Variant, ShopifyError> {
    let price = convert_money(&v.price)?;
    let core_charge = parse_core_charge(&v.id, v.core_charge);
    let add_on = parse_add_on(&v.id, v.add_on_product_id, v.add_on_quantity);

    Ok(Variant {
        title: v.title,
        available_for_sale: v.available_for_sale,
        price,
        selected_options: v
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        sku: v.sku.filter(|s| !s.is_empty()),
        core_charge,
        waiver_available: parse_flag(v.waiver_available),
        core_variant_id: text(v.core_variant_id).map(VariantId::new),
        mileage: text(v.mileage),
        condition: text(v.condition),
        estimated_delivery: text(v.estimated_delivery),
        add_on,
        id: VariantId::new(v.id),
    })
}

/// Convert a product from the `getProductByHandle` response.
///
/// # Errors
///
/// Returns `ShopifyError::InvalidData` when a variant price cannot be parsed.
pub fn convert_product(p: get_product_by_handle::Product) -> Result<Product, ShopifyError> {
    let variants = p
        .variants
        .into_nodes()
        .map(convert_variant)
        .collect::<Result<Vec<_>, _>>()?;

    let product = Product {
        id: ProductId::new(p.id),
        handle: p.handle,
        title: p.title,
        description: p.description,
        available_for_sale: p.available_for_sale,
        tags: p.tags,
        options: p
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
        variants,
    };

    if let Err(e) = product.validate() {
        warn!(handle = %product.handle, error = %e, "Product violates option invariant");
    }

    Ok(product)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal::Decimal;

    use super::*;

    fn product_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Product/1",
            "handle": "4l60e",
            "availableForSale": true,
            "title": "4L60E",
            "description": "",
            "tags": ["nextjs-frontend-hidden"],
            "options": [{ "name": "Drive", "values": ["2WD"] }],
            "variants": { "edges": [{ "node": {
                "id": "gid://shopify/ProductVariant/10",
                "title": "2WD",
                "availableForSale": true,
                "sku": "",
                "selectedOptions": [{ "name": "Drive", "value": "2WD" }],
                "price": { "amount": "1899.0", "currencyCode": "USD" },
                "coreCharge": { "value": "{\"amount\":\"500.0\",\"currency_code\":\"USD\"}" },
                "waiverAvailable": { "value": "true" },
                "coreVariantId": { "value": "gid://shopify/ProductVariant/99" },
                "estimatedDelivery": null,
                "mileage": { "value": "85,000" },
                "condition": null,
                "addOnQuantity": { "value": "2" },
                "addOnProductId": { "value": "gid://shopify/ProductVariant/77" }
            }}]}
        })
    }

    #[test]
    fn test_convert_product_metafields() {
        let raw: get_product_by_handle::Product = serde_json::from_value(product_json()).unwrap();
        let product = convert_product(raw).unwrap();
        let variant = product.variants.first().unwrap();

        assert_eq!(variant.price.amount, Decimal::from(1899));
        assert_eq!(variant.core_charge.map(|p| p.amount), Some(Decimal::from(500)));
        assert!(variant.waiver_available);
        assert_eq!(
            variant.core_variant_id.as_ref().map(VariantId::as_str),
            Some("gid://shopify/ProductVariant/99")
        );
        assert_eq!(variant.mileage.as_deref(), Some("85,000"));
        assert_eq!(variant.sku, None);
        assert_eq!(variant.add_on.as_ref().map(|a| a.quantity), Some(2));
        // Hidden products are still served on the detail page.
        assert_eq!(product.tags, ["nextjs-frontend-hidden"]);
    }

    #[test]
    fn test_bad_core_charge_is_ignored() {
        let mut json = product_json();
        json["variants"]["edges"][0]["node"]["coreCharge"] = serde_json::json!({ "value": "lots" });
        let raw: get_product_by_handle::Product = serde_json::from_value(json).unwrap();
        let product = convert_product(raw).unwrap();
        assert_eq!(product.variants.first().unwrap().core_charge, None);
    }

    #[test]
    fn test_bad_price_is_an_error() {
        let mut json = product_json();
        json["variants"]["edges"][0]["node"]["price"]["amount"] = serde_json::json!("free");
        let raw: get_product_by_handle::Product = serde_json::from_value(json).unwrap();
        assert!(matches!(
            convert_product(raw),
            Err(ShopifyError::InvalidData(_))
        ));
    }
}
