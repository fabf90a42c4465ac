//! Fixtures for building flashcard packages in tests.

#![allow(dead_code)]

use rusqlite::{params, Connection};
use serde_json::json;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const BASIC_MODEL_ID: i64 = 1_342_697_561_419;

/// Models blob with one model per `(id, field names)` pair.
pub fn models_json(models: &[(i64, &[&str])]) -> String {
    let mut object = serde_json::Map::new();
    for (id, fields) in models {
        let flds: Vec<_> = fields
            .iter()
            .enumerate()
            .map(|(ord, name)| json!({ "name": name, "ord": ord }))
            .collect();
        object.insert(
            id.to_string(),
            json!({ "id": id, "name": format!("Model {id}"), "flds": flds }),
        );
    }
    serde_json::Value::Object(object).to_string()
}

/// Join field values with the unit separator.
pub fn fields_blob(values: &[&str]) -> String {
    values.join("\u{1f}")
}

/// Builder for `.apkg` bytes.
pub struct PackageBuilder {
    database_entry: Option<String>,
    models: String,
    notes: Vec<(i64, i64, String)>,
    manifest: Option<String>,
    blobs: Vec<(String, Vec<u8>)>,
    database_override: Option<Vec<u8>>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self {
            database_entry: Some("collection.anki21".to_string()),
            models: models_json(&[(BASIC_MODEL_ID, &["Front", "Back"])]),
            notes: Vec::new(),
            manifest: None,
            blobs: Vec::new(),
            database_override: None,
        }
    }

    pub fn database_entry(mut self, name: Option<&str>) -> Self {
        self.database_entry = name.map(str::to_string);
        self
    }

    pub fn models(mut self, models: impl Into<String>) -> Self {
        self.models = models.into();
        self
    }

    pub fn note(mut self, id: i64, model_id: i64, values: &[&str]) -> Self {
        self.notes.push((id, model_id, fields_blob(values)));
        self
    }

    pub fn manifest(mut self, manifest: serde_json::Value) -> Self {
        self.manifest = Some(manifest.to_string());
        self
    }

    pub fn blob(mut self, name: &str, data: &[u8]) -> Self {
        self.blobs.push((name.to_string(), data.to_vec()));
        self
    }

    /// Store these bytes as the database instead of a real collection.
    pub fn raw_database(mut self, data: &[u8]) -> Self {
        self.database_override = Some(data.to_vec());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        if let Some(entry) = &self.database_entry {
            let database = match &self.database_override {
                Some(data) => data.clone(),
                None => build_collection(&self.models, &self.notes),
            };
            writer.start_file(entry.as_str(), SimpleFileOptions::default()).unwrap();
            writer.write_all(&database).unwrap();
        }
        if let Some(manifest) = &self.manifest {
            writer.start_file("media", SimpleFileOptions::default()).unwrap();
            writer.write_all(manifest.as_bytes()).unwrap();
        }
        for (name, data) in &self.blobs {
            writer.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }
}

fn build_collection(models: &str, notes: &[(i64, i64, String)]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collection.anki21");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE col (id INTEGER PRIMARY KEY, crt INTEGER NOT NULL DEFAULT 0, models TEXT NOT NULL, decks TEXT NOT NULL DEFAULT '{}');
            CREATE TABLE notes (
                id INTEGER PRIMARY KEY,
                guid TEXT NOT NULL DEFAULT '',
                mid INTEGER NOT NULL,
                mod INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '',
                flds TEXT NOT NULL,
                sfld TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .unwrap();
        conn.execute("INSERT INTO col (id, models) VALUES (1, ?1)", params![models])
            .unwrap();
        for (id, mid, flds) in notes {
            conn.execute(
                "INSERT INTO notes (id, mid, flds) VALUES (?1, ?2, ?3)",
                params![id, mid, flds],
            )
            .unwrap();
        }
    }
    std::fs::read(&path).unwrap()
}
