//! Flashcard package importer.
//!
//! Turns an exported flashcard package (a zip archive with an embedded
//! SQLite collection and audio media) into a normalized card collection.
//!
//! Provides:
//! - Container and media extraction (audio as data URIs)
//! - Model schema parsing and note decoding with markup stripping
//! - Field coverage statistics for choosing which fields to keep
//! - Conversion to the normalized collection format

pub mod container;
pub mod convert;
pub mod db;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod import;
pub mod markup;
pub mod media;
pub mod schema;
pub mod settings;
pub mod stats;
pub mod task;
pub mod types;

pub use container::PackageContainer;
pub use convert::convert;
pub use decoder::NoteDecoder;
pub use diagnostics::{ImportDiagnostics, ImportWarning};
pub use error::{ImportError, Result};
pub use import::{import_package, inspect_package, ImportOutcome, ImportRequest, PackagePreview};
pub use markup::clean_markup;
pub use schema::{parse_models, SchemaCatalog};
pub use settings::ImportSettings;
pub use stats::{analyze, FieldAnalysis};
pub use task::{import_package_blocking, inspect_package_blocking};
pub use types::{
    DecodedField, DecodedNote, FieldDefinition, FieldStat, FieldType, ImportFieldSelection,
    MediaAsset, ModelSchema, NormalizedCard, NormalizedCollection, OrderedMap, RawNote,
    SelectedField,
};
