//! Price composition for the product detail page.
//!
//! The amount due today is the part's base price, plus the refundable core
//! deposit unless it is waived, plus a store-specific delivery surcharge.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Variant;
use crate::selection::CORE_WAIVER;
use crate::types::{Price, VariantId};

/// Delivery destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryChoice {
    /// Delivery to a business with a loading dock.
    #[default]
    Commercial,
    /// Delivery to a home address, which needs a liftgate.
    Residential,
}

impl DeliveryChoice {
    pub const ALL: [Self; 2] = [Self::Commercial, Self::Residential];

    /// The value carried in the query string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Commercial => "Commercial",
            Self::Residential => "Residential",
        }
    }
}

impl fmt::Display for DeliveryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a query value is not a delivery choice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown delivery choice: {0}")]
pub struct UnknownDeliveryChoice(pub String);

impl FromStr for DeliveryChoice {
    type Err = UnknownDeliveryChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Commercial" => Ok(Self::Commercial),
            "Residential" => Ok(Self::Residential),
            other => Err(UnknownDeliveryChoice(other.to_string())),
        }
    }
}

/// Fixed delivery surcharge per choice for one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRates {
    pub commercial: Decimal,
    pub residential: Decimal,
}

impl DeliveryRates {
    #[must_use]
    pub const fn new(commercial: Decimal, residential: Decimal) -> Self {
        Self {
            commercial,
            residential,
        }
    }

    #[must_use]
    pub const fn surcharge(&self, choice: DeliveryChoice) -> Decimal {
        match choice {
            DeliveryChoice::Commercial => self.commercial,
            DeliveryChoice::Residential => self.residential,
        }
    }
}

/// The customer's decision about the core deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreChoice {
    /// No deposit; the old core is not returned.
    Waived,
    /// Deposit paid through the given core variant.
    Charged(VariantId),
}

impl CoreChoice {
    /// Interpret the raw selection value.
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        if value == CORE_WAIVER {
            Self::Waived
        } else {
            Self::Charged(VariantId::new(value))
        }
    }

    /// The raw selection value.
    #[must_use]
    pub fn as_value(&self) -> &str {
        match self {
            Self::Waived => CORE_WAIVER,
            Self::Charged(id) => id.as_str(),
        }
    }

    #[must_use]
    pub const fn is_waived(&self) -> bool {
        matches!(self, Self::Waived)
    }
}

/// A selectable core-charge option for a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreChargeOption {
    pub label: &'static str,
    /// Value stored under the core key of the selection.
    pub value: String,
    pub price: Price,
}

/// The core-charge options a variant offers, waiver first.
#[must_use]
pub fn core_charge_options(variant: &Variant) -> Vec<CoreChargeOption> {
    let mut options = Vec::with_capacity(2);
    if variant.waiver_available {
        options.push(CoreChargeOption {
            label: "Waive Core",
            value: CORE_WAIVER.to_string(),
            price: Price::zero(variant.price.currency_code),
        });
    }
    if let (Some(core_variant_id), Some(core_charge)) =
        (&variant.core_variant_id, variant.core_charge)
    {
        options.push(CoreChargeOption {
            label: "Fully Refundable",
            value: core_variant_id.to_string(),
            price: core_charge,
        });
    }
    options
}

/// Breakdown of the amount due today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    pub base: Price,
    pub core: Price,
    pub delivery: Price,
    pub total: Price,
}

/// Compose the amount due today.
///
/// Without a variant the caller's `default_price` stands in for the base
/// price and its currency is used throughout. The core deposit is added
/// unless the choice is [`CoreChoice::Waived`] or the variant has no core
/// charge; no choice at all still counts the deposit. No delivery choice
/// adds nothing.
#[must_use]
pub fn compute_total(
    variant: Option<&Variant>,
    core_choice: Option<&CoreChoice>,
    delivery_choice: Option<DeliveryChoice>,
    rates: &DeliveryRates,
    default_price: Price,
) -> PriceSummary {
    let base = variant.map_or(default_price, |v| v.price);
    let currency = base.currency_code;

    let core_amount = match (core_choice, variant.and_then(|v| v.core_charge)) {
        (Some(CoreChoice::Waived), _) | (_, None) => Decimal::ZERO,
        (_, Some(charge)) => charge.amount,
    };
    let delivery_amount = delivery_choice.map_or(Decimal::ZERO, |c| rates.surcharge(c));

    PriceSummary {
        base,
        core: Price::new(core_amount, currency),
        delivery: Price::new(delivery_amount, currency),
        total: base.plus(core_amount + delivery_amount),
    }
}
