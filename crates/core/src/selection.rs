//! Selection state and its query-string codec.
//!
//! The product page keeps every customer decision in the URL: one parameter
//! per option (keyed by the lowercased option name) plus two reserved keys for
//! the core-charge choice and the delivery choice. [`SelectionState`] is that
//! map. It performs no validation; the resolver decides what a state means.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::catalog::{ProductOption, Variant};
use crate::pricing::{CoreChoice, DeliveryChoice};

/// Query key holding the core-charge choice.
pub const CORE_VARIANT_ID_KEY: &str = "coreVariantId";

/// Value of [`CORE_VARIANT_ID_KEY`] when the customer waives the core charge.
pub const CORE_WAIVER: &str = "core-waiver";

/// Query key holding the delivery choice.
pub const DELIVERY_OPTION_KEY: &str = "delivery";

/// Keys that are always decoded regardless of the product's options.
pub const RESERVED_KEYS: [&str; 2] = [CORE_VARIANT_ID_KEY, DELIVERY_OPTION_KEY];

/// Query key for an option name.
///
/// Decoding, lookups and writes all fold case through this one function, so
/// a key written for an option always decodes back to the same option.
#[must_use]
pub fn option_key(name: &str) -> String {
    name.to_lowercase()
}

/// Map of selection keys to chosen values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState(BTreeMap<String, String>);

impl SelectionState {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Decode query parameters against a product's options.
    ///
    /// A parameter is kept when its key names one of `options` (ignoring
    /// case, stored lowercased) or is a reserved key (exact match). Anything
    /// else is ignored. When a key repeats, the first occurrence wins.
    pub fn decode<I, K, V>(params: I, options: &[ProductOption]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = Self::new();
        for (key, value) in params {
            let key = key.as_ref();
            let normalized = if RESERVED_KEYS.contains(&key) {
                key.to_string()
            } else {
                let folded = option_key(key);
                if !options.iter().any(|o| option_key(&o.name) == folded) {
                    continue;
                }
                folded
            };
            state
                .0
                .entry(normalized)
                .or_insert_with(|| value.as_ref().to_string());
        }
        state
    }

    /// Decode a raw query string (without the leading `?`).
    #[must_use]
    pub fn from_query(query: &str, options: &[ProductOption]) -> Self {
        Self::decode(form_urlencoded::parse(query.as_bytes()), options)
    }

    /// Every entry as a query parameter, keys written verbatim.
    #[must_use]
    pub fn encode(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Encode as a URL query string (without the leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a key, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether a raw query key names an entry of this state.
    ///
    /// Reserved keys match exactly; option keys match after case folding.
    #[must_use]
    pub fn owns(&self, raw_key: &str) -> bool {
        if RESERVED_KEYS.contains(&raw_key) {
            return self.contains(raw_key);
        }
        let folded = option_key(raw_key);
        !RESERVED_KEYS.contains(&folded.as_str()) && self.contains(&folded)
    }

    /// The value chosen for an option, looked up by its lowercased name.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&str> {
        self.get(&option_key(name))
    }

    /// Set an option value under its lowercased name.
    pub fn set_option(&mut self, name: &str, value: impl Into<String>) {
        self.set(option_key(name), value);
    }

    /// Write every option a variant selects into the state.
    pub fn select_variant(&mut self, variant: &Variant) {
        for option in &variant.selected_options {
            self.set_option(&option.name, option.value.clone());
        }
    }

    /// Shallow merge: every key in `update` overwrites the same key here.
    pub fn merge(&mut self, update: &Self) {
        for (k, v) in &update.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Decoded core-charge choice, if any.
    #[must_use]
    pub fn core_choice(&self) -> Option<CoreChoice> {
        self.get(CORE_VARIANT_ID_KEY).map(CoreChoice::from_value)
    }

    /// Decoded delivery choice. Unknown values count as no choice.
    #[must_use]
    pub fn delivery_choice(&self) -> Option<DeliveryChoice> {
        self.get(DELIVERY_OPTION_KEY).and_then(|v| v.parse().ok())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SelectionState {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::transmission;

    #[test]
    fn test_decode_matches_option_names_case_insensitively() {
        let product = transmission();
        let state = SelectionState::from_query(
            "DRIVE=4WD&condition=Reman&utm_source=ads&delivery=Residential",
            &product.options,
        );
        assert_eq!(state.option("Drive"), Some("4WD"));
        assert_eq!(state.get("condition"), Some("Reman"));
        assert_eq!(state.get(DELIVERY_OPTION_KEY), Some("Residential"));
        assert!(!state.contains("utm_source"));
    }

    #[test]
    fn test_decode_first_occurrence_wins() {
        let product = transmission();
        let state = SelectionState::from_query("drive=2WD&drive=4WD", &product.options);
        assert_eq!(state.option("drive"), Some("2WD"));
    }

    #[test]
    fn test_round_trip() {
        let product = transmission();
        let states = [
            SelectionState::new(),
            SelectionState::from_query("drive=2WD", &product.options),
            [
                ("drive", "4WD"),
                ("condition", "Used & Tested"),
                (CORE_VARIANT_ID_KEY, "gid://shopify/ProductVariant/99"),
                (DELIVERY_OPTION_KEY, "Commercial"),
            ]
            .into_iter()
            .collect(),
        ];
        for state in states {
            let query = state.to_query();
            assert_eq!(SelectionState::from_query(&query, &product.options), state);
            assert_eq!(SelectionState::decode(state.encode(), &product.options), state);
        }
    }

    #[test]
    fn test_non_ascii_option_name_survives_round_trip() {
        let options = vec![ProductOption {
            name: "Überholung".to_string(),
            values: vec!["Ja".to_string(), "Nein".to_string()],
        }];
        let mut state = SelectionState::new();
        state.set_option("Überholung", "Ja");

        let decoded = SelectionState::from_query(&state.to_query(), &options);
        assert_eq!(decoded, state);
        assert_eq!(decoded.option("Überholung"), Some("Ja"));

        let upper = SelectionState::from_query("%C3%9CBERHOLUNG=Nein", &options);
        assert_eq!(upper.option("überholung"), Some("Nein"));
    }

    #[test]
    fn test_owns_folds_option_keys_only() {
        let state: SelectionState = [("drive", "4WD"), (DELIVERY_OPTION_KEY, "Commercial")]
            .into_iter()
            .collect();
        assert!(state.owns("Drive"));
        assert!(state.owns(DELIVERY_OPTION_KEY));
        assert!(!state.owns("Delivery"));
        assert!(!state.owns("utm_source"));
    }

    #[test]
    fn test_reserved_keys_are_case_sensitive() {
        let state = SelectionState::from_query("COREVARIANTID=x&Delivery=Commercial", &[]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut state: SelectionState = [("drive", "2WD"), ("condition", "Used")]
            .into_iter()
            .collect();
        let update: SelectionState = [("drive", "4WD")].into_iter().collect();
        state.merge(&update);
        assert_eq!(state.get("drive"), Some("4WD"));
        assert_eq!(state.get("condition"), Some("Used"));
    }

    #[test]
    fn test_choice_accessors() {
        let state: SelectionState = [
            (CORE_VARIANT_ID_KEY, CORE_WAIVER),
            (DELIVERY_OPTION_KEY, "Residential"),
        ]
        .into_iter()
        .collect();
        assert_eq!(state.core_choice(), Some(CoreChoice::Waived));
        assert_eq!(state.delivery_choice(), Some(DeliveryChoice::Residential));

        let bogus: SelectionState = [(DELIVERY_OPTION_KEY, "Drone")].into_iter().collect();
        assert_eq!(bogus.delivery_choice(), None);
    }
}
