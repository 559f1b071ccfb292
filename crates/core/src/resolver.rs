//! Variant resolution.
//!
//! Turns a [`SelectionState`] into a concrete [`Variant`]. A miss is never an
//! error: the default policy picks the cheapest variant that can be bought,
//! falling back to the first variant in catalog order.

use serde::Serialize;

use crate::catalog::{Product, Variant};
use crate::selection::SelectionState;

/// How the variant for a page was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The selection named this variant.
    Matched(&'a Variant),
    /// Nothing matched; this is the default variant.
    Defaulted(&'a Variant),
    /// The product has no variants at all.
    Empty,
}

impl<'a> Resolution<'a> {
    /// The variant regardless of how it was chosen.
    #[must_use]
    pub const fn variant(&self) -> Option<&'a Variant> {
        match *self {
            Self::Matched(v) | Self::Defaulted(v) => Some(v),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub const fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}

/// Whether `variant` carries exactly the values `state` selects for every
/// product option.
#[must_use]
pub fn matches(product: &Product, variant: &Variant, state: &SelectionState) -> bool {
    product.options.iter().all(|option| {
        match (state.option(&option.name), variant.option_value(&option.name)) {
            (Some(wanted), Some(has)) => wanted == has,
            _ => false,
        }
    })
}

/// The first variant in catalog order matching `state`.
#[must_use]
pub fn resolve<'a>(product: &'a Product, state: &SelectionState) -> Option<&'a Variant> {
    product.variants.iter().find(|v| matches(product, v, state))
}

/// The variant shown when the selection names nothing.
///
/// The available-for-sale variant with the lowest base price, ties going to
/// the earlier variant. Without any available variant, the first one.
#[must_use]
pub fn default_variant(product: &Product) -> Option<&Variant> {
    product
        .variants
        .iter()
        .filter(|v| v.available_for_sale)
        .reduce(|min, v| if v.price.amount < min.price.amount { v } else { min })
        .or_else(|| product.variants.first())
}

/// Resolve, applying the default policy on a miss.
#[must_use]
pub fn resolve_or_default<'a>(product: &'a Product, state: &SelectionState) -> Resolution<'a> {
    if let Some(variant) = resolve(product, state) {
        return Resolution::Matched(variant);
    }
    default_variant(product).map_or(Resolution::Empty, Resolution::Defaulted)
}

/// Availability of one option value given the rest of the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionValueState {
    pub value: String,
    /// Currently selected.
    pub active: bool,
    /// Some purchasable variant carries this value together with the other
    /// current choices.
    pub available_for_sale: bool,
}

/// One option with the state of each of its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionState {
    pub name: String,
    pub values: Vec<OptionValueState>,
}

/// Compute which values of every option can still lead to a purchasable
/// variant.
///
/// For each value the current selection is overridden with that value; only
/// entries naming a real option and one of its allowed values are kept. The
/// value is available when some variant that is for sale matches every kept
/// entry.
#[must_use]
pub fn option_matrix(product: &Product, state: &SelectionState) -> Vec<OptionState> {
    product
        .options
        .iter()
        .map(|option| OptionState {
            name: option.name.clone(),
            values: option
                .values
                .iter()
                .map(|value| {
                    let mut candidate = state.clone();
                    candidate.set_option(&option.name, value.clone());
                    let filters: Vec<(&str, &str)> = product
                        .options
                        .iter()
                        .filter_map(|o| {
                            candidate
                                .option(&o.name)
                                .filter(|chosen| o.values.iter().any(|v| v == *chosen))
                                .map(|chosen| (o.name.as_str(), chosen))
                        })
                        .collect();
                    let available_for_sale = product.variants.iter().any(|variant| {
                        variant.available_for_sale
                            && filters
                                .iter()
                                .all(|(name, chosen)| variant.option_value(name) == Some(*chosen))
                    });
                    OptionValueState {
                        value: value.clone(),
                        active: state.option(&option.name) == Some(value.as_str()),
                        available_for_sale,
                    }
                })
                .collect(),
        })
        .collect()
}
