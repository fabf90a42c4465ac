//! Model schema extraction from the collection's models blob.
//!
//! # Format
//! ```json
//! {
//!   "1342697561419": {
//!     "name": "Basic",
//!     "flds": [{ "name": "Front", "ord": 0 }, { "name": "Back", "ord": 1 }]
//!   }
//! }
//! ```

use crate::diagnostics::{ImportDiagnostics, ImportWarning};
use crate::types::{ModelField, ModelSchema};
use serde::Deserialize;
use std::collections::HashMap;

/// Canonical ordinal for each field name seen in any model.
pub type FieldOrdering = HashMap<String, usize>;

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    flds: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    name: String,
    #[serde(default)]
    ord: Option<usize>,
}

/// Every model schema of a collection plus the field ordering they imply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    models: HashMap<i64, ModelSchema>,
    field_order: FieldOrdering,
}

impl SchemaCatalog {
    pub fn get(&self, model_id: i64) -> Option<&ModelSchema> {
        self.models.get(&model_id)
    }

    pub fn models(&self) -> &HashMap<i64, ModelSchema> {
        &self.models
    }

    /// Ordinal per field name. When models disagree, the model with the
    /// lowest id wins.
    pub fn field_order(&self) -> &FieldOrdering {
        &self.field_order
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn from_models(models: HashMap<i64, ModelSchema>) -> Self {
        let mut ids: Vec<i64> = models.keys().copied().collect();
        ids.sort_unstable();

        let mut field_order = FieldOrdering::new();
        for id in ids {
            for field in &models[&id].fields {
                field_order.entry(field.name.clone()).or_insert(field.ord);
            }
        }
        Self {
            models,
            field_order,
        }
    }
}

impl FromIterator<ModelSchema> for SchemaCatalog {
    fn from_iter<I: IntoIterator<Item = ModelSchema>>(iter: I) -> Self {
        Self::from_models(iter.into_iter().map(|m| (m.model_id, m)).collect())
    }
}

/// Parse the models blob. An unparsable blob yields an empty catalog so
/// notes fall back to positional field names.
pub fn parse_models(blob: &str, diagnostics: &mut ImportDiagnostics) -> SchemaCatalog {
    let entries: HashMap<String, serde_json::Value> = match serde_json::from_str(blob) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "models blob is not a JSON object");
            diagnostics.push(ImportWarning::InvalidModels {
                reason: e.to_string(),
            });
            return SchemaCatalog::default();
        }
    };

    let mut models = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let Ok(model_id) = key.parse::<i64>() else {
            tracing::debug!(key = %key, "ignoring model with non-numeric id");
            continue;
        };
        let entry = match serde_json::from_value::<ModelEntry>(value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(model_id, error = %e, "ignoring malformed model");
                continue;
            }
        };
        models.insert(model_id, build_schema(model_id, entry));
    }

    tracing::debug!(count = models.len(), "parsed model schemas");
    SchemaCatalog::from_models(models)
}

fn build_schema(model_id: i64, entry: ModelEntry) -> ModelSchema {
    let mut fields: Vec<ModelField> = entry
        .flds
        .into_iter()
        .enumerate()
        .map(|(position, field)| ModelField {
            name: field.name,
            ord: field.ord.unwrap_or(position),
        })
        .collect();
    fields.sort_by_key(|f| f.ord);

    ModelSchema {
        model_id,
        name: entry.name,
        fields,
    }
}
