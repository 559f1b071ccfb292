//! Reman Core - product selection and pricing logic.
//!
//! This crate holds everything the storefront decides without talking to the
//! network:
//! - which variant a product page shows for a given query string
//! - what the customer owes today (part, core deposit, delivery)
//! - which cart lines a selection turns into
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for Shopify IDs and prices
//! - [`catalog`] - Products, options and variants
//! - [`selection`] - Selection state and its query-string codec
//! - [`resolver`] - Variant resolution and the default-selection policy
//! - [`pricing`] - Core charge, delivery and total composition
//! - [`optimistic`] - Confirmed/speculative selection store
//! - [`cart`] - Cart line planning

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod optimistic;
pub mod pricing;
pub mod resolver;
pub mod selection;
pub mod types;

pub use cart::{CartPlanError, PlannedLine, plan_lines};
pub use catalog::{AddOn, CatalogError, Product, ProductOption, SelectedOption, Variant};
pub use optimistic::{HistoryReplace, OptimisticSelection};
pub use pricing::{
    CoreChargeOption, CoreChoice, DeliveryChoice, DeliveryRates, PriceSummary, compute_total,
    core_charge_options,
};
pub use resolver::{Resolution, default_variant, resolve, resolve_or_default};
pub use selection::SelectionState;
pub use types::*;
