//! Core types for package import.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Audio file extracted from the package, ready for inline playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub file_name: String,
    pub mime_type: String,
    /// `data:<mime>;base64,<payload>` URI.
    pub data_uri: String,
}

/// One field declared by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelField {
    pub name: String,
    pub ord: usize,
}

/// Field layout of one model (note type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub model_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sorted by `ord`.
    pub fields: Vec<ModelField>,
}

impl ModelSchema {
    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Note row as stored in the collection database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNote {
    pub note_id: i64,
    pub model_id: i64,
    /// All field values joined by the unit separator (0x1F).
    pub fields_blob: String,
}

/// Field value after audio extraction and markup stripping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedField {
    pub name: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Arc<MediaAsset>>,
}

/// Note with named, cleaned field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<i64>,
    pub fields: Vec<DecodedField>,
}

impl DecodedNote {
    /// Look up a field by its original name.
    pub fn field(&self, name: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Population statistics for one field name across all notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStat {
    pub field_name: String,
    pub populated_count: usize,
    /// Rounded share of all notes, 0..=100.
    pub percentage: u32,
    pub sample_text: String,
    pub original_order: usize,
    pub is_useful: bool,
}

/// Semantic type assigned to an imported field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    AnnotatedText,
}

impl Default for FieldType {
    fn default() -> Self {
        Self::Text
    }
}

/// One field the caller chose to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedField {
    pub name: String,
    #[serde(default)]
    pub field_type: FieldType,
}

/// Ordered subset of source fields to carry into the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFieldSelection {
    pub fields: Vec<SelectedField>,
}

impl ImportFieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every name as plain text, keeping the given order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names
                .into_iter()
                .map(|name| SelectedField {
                    name: name.into(),
                    field_type: FieldType::Text,
                })
                .collect(),
        }
    }

    /// Append a field with an explicit type.
    pub fn with(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(SelectedField {
            name: name.into(),
            field_type,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Display metadata for one field of the normalized collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub order: usize,
}

/// Card in the normalized collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCard {
    pub id: String,
    pub fields: OrderedMap<String>,
}

/// Application-ready result of an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCollection {
    pub name: String,
    #[serde(rename = "customFields")]
    pub custom_fields: OrderedMap<FieldDefinition>,
    pub cards: Vec<NormalizedCard>,
}

/// String-keyed map that keeps insertion order, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordered_map_keeps_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        map.insert("zeta", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(map.get("zeta"), Some(&3));
    }

    #[test]
    fn ordered_map_serializes_as_object_in_order() {
        let mut map = OrderedMap::new();
        map.insert("field_1", "b".to_string());
        map.insert("field_0", "a".to_string());
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"field_1":"b","field_0":"a"}"#);

        let back: OrderedMap<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["field_1", "field_0"]);
    }

    #[test]
    fn field_definition_uses_type_key() {
        let def = FieldDefinition {
            label: "Front".to_string(),
            field_type: FieldType::AnnotatedText,
            order: 0,
        };
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["type"], "annotated_text");
        assert_eq!(value["label"], "Front");
    }

    #[test]
    fn selection_builder_keeps_order() {
        let selection = ImportFieldSelection::from_names(["Back", "Front"])
            .with("Reading", FieldType::AnnotatedText);
        let names: Vec<_> = selection.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Back", "Front", "Reading"]);
        assert_eq!(selection.fields[2].field_type, FieldType::AnnotatedText);
    }
}
