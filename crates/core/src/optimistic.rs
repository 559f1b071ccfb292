//! Optimistic selection store.
//!
//! The confirmed selection always comes from the URL. While an update is in
//! flight the page shows a speculative view: the confirmed state with the
//! update shallow-merged on top. Committing turns the view into a history
//! *replace* so the URL becomes the new confirmed state.

use url::form_urlencoded;

use crate::selection::SelectionState;

/// Instruction to replace the current history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReplace {
    /// Full query string (without the leading `?`).
    pub query: String,
}

impl HistoryReplace {
    /// The location to replace to for the given path.
    #[must_use]
    pub fn location(&self, path: &str) -> String {
        if self.query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", self.query)
        }
    }
}

/// Confirmed state plus an optional speculative view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimisticSelection {
    confirmed: SelectionState,
    speculative: Option<SelectionState>,
}

impl OptimisticSelection {
    /// Start from the state the URL confirms.
    #[must_use]
    pub const fn new(confirmed: SelectionState) -> Self {
        Self {
            confirmed,
            speculative: None,
        }
    }

    /// The state the page should render.
    #[must_use]
    pub fn view(&self) -> &SelectionState {
        self.speculative.as_ref().unwrap_or(&self.confirmed)
    }

    #[must_use]
    pub const fn confirmed(&self) -> &SelectionState {
        &self.confirmed
    }

    #[must_use]
    pub const fn is_speculative(&self) -> bool {
        self.speculative.is_some()
    }

    /// Merge `update` over the current view, last write wins per key.
    ///
    /// Returns the new view.
    pub fn apply(&mut self, update: &SelectionState) -> &SelectionState {
        let mut next = self.view().clone();
        next.merge(update);
        self.speculative.insert(next)
    }

    /// Produce the history replace carrying the full view.
    ///
    /// Parameters already in `current_query` that the view does not own are
    /// kept in their original order; keys the view owns are replaced, whatever
    /// their case.
    #[must_use]
    pub fn commit(&self, current_query: &str) -> HistoryReplace {
        let view = self.view();
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in form_urlencoded::parse(current_query.as_bytes()) {
            if !view.owns(&key) {
                serializer.append_pair(&key, &value);
            }
        }
        serializer.extend_pairs(view.iter());
        HistoryReplace {
            query: serializer.finish(),
        }
    }

    /// Abandon the speculative view.
    pub fn reset(&mut self) {
        self.speculative = None;
    }

    /// The URL moved on: adopt its state and drop the speculative view.
    pub fn confirm(&mut self, confirmed: SelectionState) {
        self.confirmed = confirmed;
        self.speculative = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::transmission;

    fn confirmed() -> SelectionState {
        [("drive", "2WD"), ("condition", "Used")].into_iter().collect()
    }

    #[test]
    fn test_apply_merges_over_view() {
        let mut store = OptimisticSelection::new(confirmed());
        store.apply(&[("drive", "4WD")].into_iter().collect());
        store.apply(&[("delivery", "Residential")].into_iter().collect());

        let view = store.view();
        assert_eq!(view.get("drive"), Some("4WD"));
        assert_eq!(view.get("condition"), Some("Used"));
        assert_eq!(view.get("delivery"), Some("Residential"));
        assert_eq!(store.confirmed(), &confirmed());
    }

    #[test]
    fn test_reset_restores_confirmed() {
        let mut store = OptimisticSelection::new(confirmed());
        store.apply(&[("drive", "4WD")].into_iter().collect());
        assert!(store.is_speculative());
        store.reset();
        assert_eq!(store.view(), &confirmed());
    }

    #[test]
    fn test_commit_carries_full_view_and_keeps_foreign_params() {
        let product = transmission();
        let mut store = OptimisticSelection::new(confirmed());
        store.apply(&[("drive", "4WD")].into_iter().collect());

        let replace = store.commit("utm_source=ads&drive=2WD");
        assert!(replace.query.starts_with("utm_source=ads&"));

        let decoded = SelectionState::from_query(&replace.query, &product.options);
        assert_eq!(&decoded, store.view());
        assert!(replace.location("/product/x").starts_with("/product/x?"));
    }

    #[test]
    fn test_commit_replaces_mixed_case_option_keys() {
        let product = transmission();
        let mut store =
            OptimisticSelection::new(SelectionState::from_query("Drive=2WD", &product.options));
        store.apply(&[("drive", "4WD")].into_iter().collect());

        let replace = store.commit("Drive=2WD&utm_source=ads");
        assert!(!replace.query.contains("Drive=2WD"));
        assert!(replace.query.contains("utm_source=ads"));

        let decoded = SelectionState::from_query(&replace.query, &product.options);
        assert_eq!(decoded.option("drive"), Some("4WD"));
        assert_eq!(&decoded, store.view());
    }

    #[test]
    fn test_confirm_drops_speculation() {
        let mut store = OptimisticSelection::new(SelectionState::new());
        store.apply(&confirmed());
        store.confirm(confirmed());
        assert!(!store.is_speculative());
        assert_eq!(store.view(), &confirmed());
    }
}
