//! End-to-end package import.
//!
//! The flow has two phases so a caller can let the user pick fields:
//! [`inspect_package`] decodes everything and ranks the fields, then
//! [`PackagePreview::convert`] produces the collection for a selection.
//! [`import_package`] runs both in one call.

use crate::container::PackageContainer;
use crate::convert::convert;
use crate::db::{CollectionSource, SqliteCollection};
use crate::decoder::NoteDecoder;
use crate::diagnostics::{ImportDiagnostics, ImportWarning};
use crate::error::{ImportError, Result};
use crate::media::{build_manifest, resolve_assets};
use crate::schema::{parse_models, SchemaCatalog};
use crate::settings::ImportSettings;
use crate::stats::{analyze, FieldAnalysis};
use crate::types::{DecodedNote, ImportFieldSelection, NormalizedCollection};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PACKAGE_EXTENSIONS: &[&str] = &["apkg", "colpkg"];

/// Everything decoded from a package, before field selection.
#[derive(Debug, Clone, Serialize)]
pub struct PackagePreview {
    pub suggested_name: String,
    pub database_entry: String,
    pub media_count: usize,
    pub notes: Vec<DecodedNote>,
    pub analysis: FieldAnalysis,
    pub diagnostics: ImportDiagnostics,
}

impl PackagePreview {
    /// Fields pre-selected for the user.
    pub fn default_selection(&self, settings: &ImportSettings) -> ImportFieldSelection {
        self.analysis.default_selection(settings)
    }

    /// Build the collection for a chosen set of fields.
    pub fn convert(&self, selection: &ImportFieldSelection) -> NormalizedCollection {
        convert(&self.notes, selection, &self.suggested_name)
    }
}

/// One-shot import parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    /// File name the package was loaded from, used to name the collection.
    #[serde(default)]
    pub source_name: Option<String>,
    /// Fields to import. Uses the default selection when absent.
    #[serde(default)]
    pub selection: Option<ImportFieldSelection>,
    #[serde(default)]
    pub settings: ImportSettings,
}

/// Result of a one-shot import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub collection: NormalizedCollection,
    pub diagnostics: ImportDiagnostics,
}

/// Decode a package and rank its fields.
pub fn inspect_package(
    bytes: &[u8],
    source_name: Option<&str>,
    settings: &ImportSettings,
) -> Result<PackagePreview> {
    let settings = settings.clone().validated();
    let mut diagnostics = ImportDiagnostics::new();

    let mut container = PackageContainer::open(bytes)?;
    let database_entry = container.database_entry();
    tracing::info!(entry = database_entry, "importing package");

    let manifest = build_manifest(&mut container, &mut diagnostics);
    let assets = resolve_assets(&mut container, &manifest, &mut diagnostics);
    let database = container.read_database()?;

    let collection = SqliteCollection::load(&database)?;
    let schemas = match collection.read_models_blob() {
        Ok(blob) => parse_models(&blob, &mut diagnostics),
        Err(e) => {
            tracing::warn!(error = %e, "collection has no readable models");
            diagnostics.push(ImportWarning::InvalidModels {
                reason: e.to_string(),
            });
            SchemaCatalog::default()
        }
    };
    let raw_notes = collection.read_notes(&mut diagnostics)?;
    if let Err(e) = collection.close() {
        tracing::warn!(error = %e, "failed to release collection database");
    }

    let notes = NoteDecoder::new(&schemas, &assets).decode_all(&raw_notes, &mut diagnostics);
    if notes.is_empty() {
        return Err(ImportError::EmptyCollection);
    }

    let analysis = analyze(&notes, schemas.field_order(), &settings);
    tracing::info!(
        notes = notes.len(),
        models = schemas.len(),
        media = assets.len(),
        fields = analysis.stats.len(),
        warnings = diagnostics.len(),
        "decoded package"
    );

    Ok(PackagePreview {
        suggested_name: suggested_name(source_name, &settings),
        database_entry: database_entry.to_string(),
        media_count: assets.len(),
        notes,
        analysis,
        diagnostics,
    })
}

/// Decode a package and convert it in one pass.
pub fn import_package(bytes: &[u8], request: &ImportRequest) -> Result<ImportOutcome> {
    let preview = inspect_package(bytes, request.source_name.as_deref(), &request.settings)?;
    let collection = match &request.selection {
        Some(selection) => preview.convert(selection),
        None => preview.convert(&preview.default_selection(&request.settings)),
    };

    Ok(ImportOutcome {
        collection,
        diagnostics: preview.diagnostics,
    })
}

/// Collection name derived from the package file name.
pub fn suggested_name(source_name: Option<&str>, settings: &ImportSettings) -> String {
    source_name
        .and_then(|name| Path::new(name.trim()).file_name())
        .and_then(|name| name.to_str())
        .map(strip_package_extension)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| settings.default_name.clone())
}

fn strip_package_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if PACKAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    }
}
