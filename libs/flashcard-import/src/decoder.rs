//! Decoding of raw note rows into named, cleaned fields.

use crate::diagnostics::{ImportDiagnostics, ImportWarning};
use crate::markup::clean_markup;
use crate::media::MediaAssets;
use crate::schema::SchemaCatalog;
use crate::types::{DecodedField, DecodedNote, MediaAsset, ModelSchema, RawNote};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Separator between field values in a note's field blob.
pub const FIELD_SEPARATOR: char = '\u{1f}';

static SOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[sound:([^\]]+)\]").expect("valid sound marker pattern"));

/// Name used for a field without a schema entry (1-based).
pub fn positional_name(index: usize) -> String {
    format!("Field{}", index + 1)
}

/// Remove every `[sound:…]` marker, returning the remaining text and the
/// referenced file names in order.
pub fn extract_sound_markers(value: &str) -> (String, Vec<String>) {
    let files = SOUND_RE
        .captures_iter(value)
        .map(|caps| caps[1].to_string())
        .collect::<Vec<_>>();
    if files.is_empty() {
        return (value.to_string(), files);
    }
    (SOUND_RE.replace_all(value, "").into_owned(), files)
}

/// Decodes notes against a schema catalog and resolved media.
///
/// Holds per-import state: which models were already reported as missing a
/// schema, and the first-seen field count of each such model.
pub struct NoteDecoder<'a> {
    schemas: &'a SchemaCatalog,
    assets: &'a MediaAssets,
    unknown_widths: HashMap<i64, usize>,
    reported_missing: HashSet<i64>,
}

impl<'a> NoteDecoder<'a> {
    pub fn new(schemas: &'a SchemaCatalog, assets: &'a MediaAssets) -> Self {
        Self {
            schemas,
            assets,
            unknown_widths: HashMap::new(),
            reported_missing: HashSet::new(),
        }
    }

    /// Decode every note in order.
    pub fn decode_all(
        &mut self,
        notes: &[RawNote],
        diagnostics: &mut ImportDiagnostics,
    ) -> Vec<DecodedNote> {
        notes
            .iter()
            .map(|note| self.decode(note, diagnostics))
            .collect()
    }

    /// Decode one note.
    ///
    /// Values past the end of the schema get continuing positional names.
    /// A note with fewer values than its schema only carries the values it has.
    pub fn decode(&mut self, note: &RawNote, diagnostics: &mut ImportDiagnostics) -> DecodedNote {
        let values: Vec<&str> = note.fields_blob.split(FIELD_SEPARATOR).collect();
        let schemas = self.schemas;
        let schema = schemas.get(note.model_id);
        self.check_width(note, schema, values.len(), diagnostics);

        let fields = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let name = schema
                    .and_then(|s| s.fields.get(index))
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| positional_name(index));
                self.decode_field(note.note_id, name, value, diagnostics)
            })
            .collect();

        DecodedNote {
            note_id: Some(note.note_id),
            model_id: Some(note.model_id),
            fields,
        }
    }

    fn decode_field(
        &self,
        note_id: i64,
        name: String,
        value: &str,
        diagnostics: &mut ImportDiagnostics,
    ) -> DecodedField {
        // Markers are not markup; pull them out before stripping tags.
        let (remaining, files) = extract_sound_markers(value);

        let mut audio: Option<Arc<MediaAsset>> = None;
        for file in files {
            match self.assets.get(&file) {
                Some(asset) if audio.is_none() => audio = Some(Arc::clone(asset)),
                Some(_) => {}
                None => {
                    tracing::debug!(note_id, file = %file, "audio reference not resolved");
                    diagnostics.push(ImportWarning::UnresolvedAudio {
                        note_id,
                        file_name: file,
                    });
                }
            }
        }

        DecodedField {
            name,
            text: clean_markup(&remaining),
            audio,
        }
    }

    fn check_width(
        &mut self,
        note: &RawNote,
        schema: Option<&ModelSchema>,
        actual: usize,
        diagnostics: &mut ImportDiagnostics,
    ) {
        let expected = match schema {
            Some(schema) => schema.len(),
            None => {
                if self.reported_missing.insert(note.model_id) {
                    tracing::warn!(
                        model_id = note.model_id,
                        "no schema for model, using positional field names"
                    );
                    diagnostics.push(ImportWarning::MissingSchema {
                        model_id: note.model_id,
                    });
                }
                *self.unknown_widths.entry(note.model_id).or_insert(actual)
            }
        };

        if expected != actual {
            tracing::warn!(
                note_id = note.note_id,
                model_id = note.model_id,
                expected,
                actual,
                "note field count differs from its model"
            );
            diagnostics.push(ImportWarning::FieldCountMismatch {
                note_id: note.note_id,
                model_id: note.model_id,
                expected,
                actual,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelField;
    use pretty_assertions::assert_eq;

    fn catalog(model_id: i64, names: &[&str]) -> SchemaCatalog {
        std::iter::once(ModelSchema {
            model_id,
            name: None,
            fields: names
                .iter()
                .enumerate()
                .map(|(ord, name)| ModelField {
                    name: name.to_string(),
                    ord,
                })
                .collect(),
        })
        .collect()
    }

    fn raw(note_id: i64, model_id: i64, blob: &str) -> RawNote {
        RawNote {
            note_id,
            model_id,
            fields_blob: blob.to_string(),
        }
    }

    fn pairs(note: &DecodedNote) -> Vec<(&str, &str)> {
        note.fields
            .iter()
            .map(|f| (f.name.as_str(), f.text.as_str()))
            .collect()
    }

    #[test]
    fn decode_with_schema() {
        let schemas = catalog(1, &["Front", "Back"]);
        let assets = MediaAssets::new();
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        let notes = decoder.decode_all(
            &[raw(1, 1, "A\u{1f}B"), raw(2, 1, "C\u{1f}D"), raw(3, 1, "E\u{1f}F")],
            &mut diagnostics,
        );

        assert_eq!(pairs(&notes[0]), vec![("Front", "A"), ("Back", "B")]);
        assert_eq!(pairs(&notes[1]), vec![("Front", "C"), ("Back", "D")]);
        assert_eq!(pairs(&notes[2]), vec![("Front", "E"), ("Back", "F")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn decode_without_schema_uses_positions() {
        let schemas = SchemaCatalog::default();
        let assets = MediaAssets::new();
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        for blob in ["", "a", "a\u{1f}b\u{1f}c", "\u{1f}\u{1f}\u{1f}"] {
            let note = decoder.decode(&raw(1, 9, blob), &mut diagnostics);
            assert_eq!(note.fields.len(), blob.split(FIELD_SEPARATOR).count());
        }

        let note = decoder.decode(&raw(2, 9, "x\u{1f}y"), &mut diagnostics);
        assert_eq!(pairs(&note), vec![("Field1", "x"), ("Field2", "y")]);
        assert_eq!(
            diagnostics.count(|w| matches!(w, ImportWarning::MissingSchema { .. })),
            1
        );
    }

    #[test]
    fn unknown_model_width_follows_first_note() {
        let schemas = SchemaCatalog::default();
        let assets = MediaAssets::new();
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        decoder.decode(&raw(1, 9, "a\u{1f}b"), &mut diagnostics);
        decoder.decode(&raw(2, 9, "a\u{1f}b\u{1f}c"), &mut diagnostics);

        assert!(diagnostics.warnings.contains(&ImportWarning::FieldCountMismatch {
            note_id: 2,
            model_id: 9,
            expected: 2,
            actual: 3,
        }));
    }

    #[test]
    fn extra_values_get_continuing_names() {
        let schemas = catalog(1, &["Front", "Back"]);
        let assets = MediaAssets::new();
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        let note = decoder.decode(&raw(1, 1, "a\u{1f}b\u{1f}c"), &mut diagnostics);
        assert_eq!(pairs(&note), vec![("Front", "a"), ("Back", "b"), ("Field3", "c")]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn missing_values_are_not_filled() {
        let schemas = catalog(1, &["Front", "Back", "Notes"]);
        let assets = MediaAssets::new();
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        let note = decoder.decode(&raw(1, 1, "a"), &mut diagnostics);
        assert_eq!(pairs(&note), vec![("Front", "a")]);
    }

    #[test]
    fn sound_marker_resolved_and_removed() {
        let schemas = catalog(1, &["Expression"]);
        let mut assets = MediaAssets::new();
        let asset = Arc::new(MediaAsset {
            file_name: "word.mp3".to_string(),
            mime_type: "audio/mpeg".to_string(),
            data_uri: "data:audio/mpeg;base64,AAAA".to_string(),
        });
        assets.insert("word.mp3".to_string(), Arc::clone(&asset));
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        let note = decoder.decode(
            &raw(1, 1, "漢字<br>かんじ[sound:word.mp3]"),
            &mut diagnostics,
        );
        let field = &note.fields[0];
        assert_eq!(field.text, "漢字\nかんじ");
        assert_eq!(field.audio, Some(asset));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unresolved_sound_marker_is_removed() {
        let schemas = catalog(1, &["Expression"]);
        let assets = MediaAssets::new();
        let mut decoder = NoteDecoder::new(&schemas, &assets);
        let mut diagnostics = ImportDiagnostics::new();

        let note = decoder.decode(&raw(4, 1, "word [sound:missing.mp3]"), &mut diagnostics);
        assert_eq!(note.fields[0].text, "word");
        assert_eq!(note.fields[0].audio, None);
        assert_eq!(
            diagnostics.warnings,
            vec![ImportWarning::UnresolvedAudio {
                note_id: 4,
                file_name: "missing.mp3".to_string(),
            }]
        );
    }

    #[test]
    fn extract_multiple_markers() {
        let (text, files) = extract_sound_markers("[sound:a.mp3]x[sound:b.ogg]");
        assert_eq!(text, "x");
        assert_eq!(files, vec!["a.mp3".to_string(), "b.ogg".to_string()]);

        let (text, files) = extract_sound_markers("no audio");
        assert_eq!(text, "no audio");
        assert!(files.is_empty());
    }
}
