//! Mapping of decoded notes onto the normalized collection format.

use crate::types::{
    DecodedNote, FieldDefinition, ImportFieldSelection, NormalizedCard, NormalizedCollection,
    OrderedMap,
};
use chrono::Utc;

/// Key under which the selected field at `index` is stored.
pub fn field_key(index: usize) -> String {
    format!("field_{index}")
}

/// Build the normalized collection from decoded notes and a field selection.
///
/// Field definitions follow selection order. Values are looked up by the
/// field's original name; absent values become empty strings. Notes without
/// an id get one built from the conversion timestamp and their position,
/// unique within this call only.
pub fn convert(
    notes: &[DecodedNote],
    selection: &ImportFieldSelection,
    name: &str,
) -> NormalizedCollection {
    let mut custom_fields = OrderedMap::with_capacity(selection.len());
    let mut labels = Vec::with_capacity(selection.len());
    for (order, selected) in selection.fields.iter().enumerate() {
        let key = field_key(order);
        custom_fields.insert(
            key.clone(),
            FieldDefinition {
                label: selected.name.clone(),
                field_type: selected.field_type,
                order,
            },
        );
        labels.push((key, selected.name.as_str()));
    }

    let timestamp = Utc::now().timestamp_millis();
    let cards = notes
        .iter()
        .enumerate()
        .map(|(index, note)| {
            let mut fields = OrderedMap::with_capacity(labels.len());
            for (key, label) in &labels {
                let value = note
                    .field(label)
                    .map(|f| f.text.clone())
                    .unwrap_or_default();
                fields.insert(key.clone(), value);
            }
            let id = match note.note_id {
                Some(id) => id.to_string(),
                None => format!("{timestamp}-{index}"),
            };
            NormalizedCard { id, fields }
        })
        .collect();

    NormalizedCollection {
        name: name.to_string(),
        custom_fields,
        cards,
    }
}
