//! JSON API handlers consumed by the storefront's client-side widgets.

pub mod filters;
