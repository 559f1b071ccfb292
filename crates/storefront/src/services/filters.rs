//! Make/model/year/part-type vehicle filters.

use serde::{Deserialize, Serialize};

use super::kv::{KvClient, KvError};

/// One selectable filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOption {
    pub label: String,
    pub value: String,
    /// Value of the option this one narrows (a model's make, a year's model).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub collection_handle: Option<String>,
}

/// The four filter lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFilters {
    pub part_types: Vec<FilterOption>,
    pub makes: Vec<FilterOption>,
    pub models: Vec<FilterOption>,
    pub years: Vec<FilterOption>,
}

async fn list(kv: &KvClient, code: &str, name: &str) -> Result<Vec<FilterOption>, KvError> {
    Ok(kv
        .get_json::<Vec<FilterOption>>(&format!("{code}.{name}"))
        .await?
        .unwrap_or_default())
}

/// Load the filter lists for store `code`.
///
/// Any failure yields four empty lists; filters are never a hard error.
pub async fn load(kv: Option<&KvClient>, code: &str) -> VehicleFilters {
    let Some(kv) = kv else {
        return VehicleFilters::default();
    };

    let result = tokio::try_join!(
        list(kv, code, "partTypes"),
        list(kv, code, "makes"),
        list(kv, code, "models"),
        list(kv, code, "years"),
    );

    match result {
        Ok((part_types, makes, models, years)) => VehicleFilters {
            part_types,
            makes,
            models,
            years,
        },
        Err(e) => {
            tracing::warn!(error = %e, store = code, "Failed to load vehicle filters");
            VehicleFilters::default()
        }
    }
}
