//! Product catalog model.
//!
//! These are the shapes the storefront works with once a Shopify product has
//! been fetched: a product with its options and variants, plus the per-variant
//! metadata the reman business adds through metafields (core charges, mileage,
//! condition, companion core variant and add-on products).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::option_key;
use crate::types::{Price, ProductId, VariantId};

/// Errors found when checking a product against the catalog invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A variant has no value for one of the product's options.
    #[error("variant {variant} has no value for option {option}")]
    MissingOption {
        /// The offending variant.
        variant: VariantId,
        /// The option it does not cover.
        option: String,
    },

    /// A variant selects a value the option does not allow.
    #[error("variant {variant} selects {value:?} which option {option} does not allow")]
    UnknownValue {
        /// The offending variant.
        variant: VariantId,
        /// Option name.
        option: String,
        /// The value the variant selected.
        value: String,
    },
}

/// A product option such as "Transmission Type" with its allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name as authored in Shopify.
    pub name: String,
    /// Allowed values in display order.
    pub values: Vec<String>,
}

/// One option value chosen by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// Companion product that is added to the cart alongside a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    /// Variant to add.
    pub variant_id: VariantId,
    /// How many to add.
    pub quantity: u32,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub title: String,
    pub available_for_sale: bool,
    /// Base price of the part itself.
    pub price: Price,
    /// One entry per product option.
    pub selected_options: Vec<SelectedOption>,
    pub sku: Option<String>,
    /// Refundable deposit charged until the old core is returned.
    pub core_charge: Option<Price>,
    /// Whether the customer may waive the core charge.
    pub waiver_available: bool,
    /// Variant that represents the core deposit in the cart.
    pub core_variant_id: Option<VariantId>,
    pub mileage: Option<String>,
    pub condition: Option<String>,
    /// Free-form delivery estimate shown next to the price.
    pub estimated_delivery: Option<String>,
    pub add_on: Option<AddOn>,
}

impl Variant {
    /// The value this variant selects for `option`, matched exactly by name.
    #[must_use]
    pub fn option_value(&self, option: &str) -> Option<&str> {
        self.selected_options
            .iter()
            .find(|o| o.name == option)
            .map(|o| o.value.as_str())
    }

    /// Whether the variant needs the customer to decide on the core charge.
    #[must_use]
    pub const fn requires_core_choice(&self) -> bool {
        self.core_charge.is_some() || self.waiver_available
    }
}

/// A product with its options and variants in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub available_for_sale: bool,
    pub tags: Vec<String>,
    pub options: Vec<ProductOption>,
    pub variants: Vec<Variant>,
}

impl Product {
    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Look up an option by name, ignoring case.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&ProductOption> {
        let key = option_key(name);
        self.options.iter().find(|o| option_key(&o.name) == key)
    }

    /// Whether the customer actually has something to choose.
    ///
    /// Products with no options, or a single option with a single value,
    /// render without a variant selector.
    #[must_use]
    pub fn has_real_choice(&self) -> bool {
        match self.options.as_slice() {
            [] => false,
            [only] => only.values.len() > 1,
            _ => true,
        }
    }

    /// Lowest price among variants that are available for sale.
    #[must_use]
    pub fn min_available_price(&self) -> Option<Price> {
        self.variants
            .iter()
            .filter(|v| v.available_for_sale)
            .map(|v| v.price)
            .reduce(|min, p| if p.amount < min.amount { p } else { min })
    }

    /// Check that every variant selects an allowed value for every option.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in catalog order.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for variant in &self.variants {
            for option in &self.options {
                let Some(value) = variant.option_value(&option.name) else {
                    return Err(CatalogError::MissingOption {
                        variant: variant.id.clone(),
                        option: option.name.clone(),
                    });
                };
                if !option.values.iter().any(|v| v == value) {
                    return Err(CatalogError::UnknownValue {
                        variant: variant.id.clone(),
                        option: option.name.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Catalog builders shared by the unit tests in this crate.

    use rust_decimal::Decimal;

    use super::*;
    use crate::types::CurrencyCode;

    pub fn usd(amount: i64) -> Price {
        Price::new(Decimal::new(amount, 0), CurrencyCode::USD)
    }

    pub fn variant(id: &str, options: &[(&str, &str)], price: i64, available: bool) -> Variant {
        Variant {
            id: VariantId::new(format!("gid://shopify/ProductVariant/{id}")),
            title: options
                .iter()
                .map(|(_, v)| *v)
                .collect::<Vec<_>>()
                .join(" / "),
            available_for_sale: available,
            price: usd(price),
            selected_options: options
                .iter()
                .map(|(n, v)| SelectedOption {
                    name: (*n).to_string(),
                    value: (*v).to_string(),
                })
                .collect(),
            sku: None,
            core_charge: None,
            waiver_available: false,
            core_variant_id: None,
            mileage: None,
            condition: None,
            estimated_delivery: None,
            add_on: None,
        }
    }

    pub fn product(options: &[(&str, &[&str])], variants: Vec<Variant>) -> Product {
        Product {
            id: ProductId::new("gid://shopify/Product/1"),
            handle: "4l60e-transmission".to_string(),
            title: "4L60E Transmission".to_string(),
            description: String::new(),
            available_for_sale: variants.iter().any(|v| v.available_for_sale),
            tags: Vec::new(),
            options: options
                .iter()
                .map(|(name, values)| ProductOption {
                    name: (*name).to_string(),
                    values: values.iter().map(|v| (*v).to_string()).collect(),
                })
                .collect(),
            variants,
        }
    }

    /// Two-option transmission product used across the tests.
    pub fn transmission() -> Product {
        product(
            &[("Drive", &["2WD", "4WD"]), ("Condition", &["Used", "Reman"])],
            vec![
                variant("1", &[("Drive", "2WD"), ("Condition", "Used")], 900, true),
                variant("2", &[("Drive", "2WD"), ("Condition", "Reman")], 1500, true),
                variant("3", &[("Drive", "4WD"), ("Condition", "Used")], 800, false),
                variant("4", &[("Drive", "4WD"), ("Condition", "Reman")], 1700, true),
            ],
        )
    }
}
