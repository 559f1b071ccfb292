//! Cart line planning.
//!
//! Adding a reman part to the cart can add up to three lines: the core
//! deposit variant (unless waived), the part itself, and an add-on product
//! the variant is sold with.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Variant;
use crate::pricing::CoreChoice;
use crate::selection::SelectionState;
use crate::types::VariantId;

/// Why a selection cannot be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartPlanError {
    #[error("no variant selected")]
    NoVariant,

    #[error("variant is not available for sale")]
    Unavailable,

    #[error("variant has no price")]
    ZeroPrice,

    #[error("a core charge option must be chosen")]
    MissingCoreChoice,

    /// The core choice names a core variant this variant does not use, or
    /// waives a core that cannot be waived.
    #[error("core charge option is not offered for this variant")]
    InvalidCoreChoice,
}

/// One line to send to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedLine {
    pub merchandise_id: VariantId,
    pub quantity: u32,
}

/// Plan the cart lines for `variant` under `state`.
///
/// # Errors
///
/// Returns `CartPlanError` when the selection is not purchasable.
pub fn plan_lines(
    variant: Option<&Variant>,
    state: &SelectionState,
) -> Result<Vec<PlannedLine>, CartPlanError> {
    let variant = variant.ok_or(CartPlanError::NoVariant)?;
    if !variant.available_for_sale {
        return Err(CartPlanError::Unavailable);
    }
    if variant.price.is_zero() {
        return Err(CartPlanError::ZeroPrice);
    }

    let mut lines = Vec::with_capacity(3);
    match state.core_choice() {
        None if variant.requires_core_choice() => return Err(CartPlanError::MissingCoreChoice),
        None => {}
        Some(CoreChoice::Waived) if variant.waiver_available => {}
        Some(CoreChoice::Charged(id)) if variant.core_variant_id.as_ref() == Some(&id) => {
            lines.push(PlannedLine {
                merchandise_id: id,
                quantity: 1,
            });
        }
        Some(_) => return Err(CartPlanError::InvalidCoreChoice),
    }

    lines.push(PlannedLine {
        merchandise_id: variant.id.clone(),
        quantity: 1,
    });

    if let Some(add_on) = &variant.add_on
        && add_on.quantity > 0
    {
        lines.push(PlannedLine {
            merchandise_id: add_on.variant_id.clone(),
            quantity: add_on.quantity,
        });
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::AddOn;
    use crate::catalog::fixtures::{usd, variant};
    use crate::selection::{CORE_VARIANT_ID_KEY, CORE_WAIVER};

    const CORE: &str = "gid://shopify/ProductVariant/900";

    fn cored() -> Variant {
        let mut v = variant("1", &[("Drive", "2WD")], 100, true);
        v.core_charge = Some(usd(50));
        v.core_variant_id = Some(VariantId::new(CORE));
        v.waiver_available = true;
        v
    }

    fn ids(lines: &[PlannedLine]) -> Vec<&str> {
        lines.iter().map(|l| l.merchandise_id.as_str()).collect()
    }

    #[test]
    fn test_core_line_precedes_part() {
        let state: SelectionState = [(CORE_VARIANT_ID_KEY, CORE)].into_iter().collect();
        let lines = plan_lines(Some(&cored()), &state).unwrap();
        assert_eq!(ids(&lines), [CORE, "gid://shopify/ProductVariant/1"]);
    }

    #[test]
    fn test_waiver_skips_core_line() {
        let state: SelectionState = [(CORE_VARIANT_ID_KEY, CORE_WAIVER)].into_iter().collect();
        let lines = plan_lines(Some(&cored()), &state).unwrap();
        assert_eq!(ids(&lines), ["gid://shopify/ProductVariant/1"]);
    }

    #[test]
    fn test_add_on_line() {
        let mut v = cored();
        v.add_on = Some(AddOn {
            variant_id: VariantId::new("gid://shopify/ProductVariant/77"),
            quantity: 2,
        });
        let state: SelectionState = [(CORE_VARIANT_ID_KEY, CORE_WAIVER)].into_iter().collect();
        let lines = plan_lines(Some(&v), &state).unwrap();
        assert_eq!(lines.last().map(|l| l.quantity), Some(2));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_rejections() {
        let empty = SelectionState::new();
        assert_eq!(plan_lines(None, &empty), Err(CartPlanError::NoVariant));
        assert_eq!(
            plan_lines(Some(&cored()), &empty),
            Err(CartPlanError::MissingCoreChoice)
        );

        let mut sold_out = cored();
        sold_out.available_for_sale = false;
        assert_eq!(
            plan_lines(Some(&sold_out), &empty),
            Err(CartPlanError::Unavailable)
        );

        let mut free = variant("2", &[], 0, true);
        free.price.amount = Decimal::ZERO;
        assert_eq!(plan_lines(Some(&free), &empty), Err(CartPlanError::ZeroPrice));

        let mut no_waiver = cored();
        no_waiver.waiver_available = false;
        let waived: SelectionState = [(CORE_VARIANT_ID_KEY, CORE_WAIVER)].into_iter().collect();
        assert_eq!(
            plan_lines(Some(&no_waiver), &waived),
            Err(CartPlanError::InvalidCoreChoice)
        );
    }

    #[test]
    fn test_plain_variant_needs_no_core_choice() {
        let plain = variant("3", &[], 25, true);
        let lines = plan_lines(Some(&plain), &SelectionState::new()).unwrap();
        assert_eq!(lines.len(), 1);
    }
}
