//! Recoverable anomalies collected during an import.

use serde::{Deserialize, Serialize};

/// Something went wrong but the import carried on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    MissingManifest,
    InvalidManifest { reason: String },
    MissingMediaBlob { media_id: String, file_name: String },
    InvalidModels { reason: String },
    MissingSchema { model_id: i64 },
    FieldCountMismatch {
        note_id: i64,
        model_id: i64,
        expected: usize,
        actual: usize,
    },
    UnresolvedAudio { note_id: i64, file_name: String },
    MalformedNote { note_id: Option<i64>, reason: String },
}

/// Accumulator for warnings, returned next to the import result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDiagnostics {
    pub warnings: Vec<ImportWarning>,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: ImportWarning) {
        self.warnings.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Number of warnings matching a predicate.
    pub fn count(&self, predicate: impl Fn(&ImportWarning) -> bool) -> usize {
        self.warnings.iter().filter(|w| predicate(w)).count()
    }
}
