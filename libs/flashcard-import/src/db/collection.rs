//! Collection database loaded from package bytes.

use crate::db::error::DbError;
use crate::diagnostics::{ImportDiagnostics, ImportWarning};
use crate::types::RawNote;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, DatabaseName, OptionalExtension};

type Result<T> = std::result::Result<T, DbError>;

/// Offsets of the file format read/write version bytes in the SQLite header.
const HEADER_WRITE_VERSION: usize = 18;
const HEADER_READ_VERSION: usize = 19;
const WAL_FORMAT_VERSION: u8 = 2;
const ROLLBACK_FORMAT_VERSION: u8 = 1;

/// The two reads an import needs from a collection.
pub trait CollectionSource {
    /// JSON object describing every model, keyed by model id.
    fn read_models_blob(&self) -> Result<String>;

    /// Every note row. Rows that cannot be read are reported and skipped.
    fn read_notes(&self, diagnostics: &mut ImportDiagnostics) -> Result<Vec<RawNote>>;
}

/// In-memory, read-only SQLite collection.
pub struct SqliteCollection {
    conn: Connection,
}

impl SqliteCollection {
    /// Load a collection from raw database file bytes.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut image = bytes.to_vec();
        // WAL-mode images cannot be opened from memory.
        if image.len() > HEADER_READ_VERSION
            && image[HEADER_WRITE_VERSION] == WAL_FORMAT_VERSION
            && image[HEADER_READ_VERSION] == WAL_FORMAT_VERSION
        {
            image[HEADER_WRITE_VERSION] = ROLLBACK_FORMAT_VERSION;
            image[HEADER_READ_VERSION] = ROLLBACK_FORMAT_VERSION;
        }

        let mut conn = Connection::open_in_memory()?;
        let size = image.len();
        conn.deserialize_read_exact(DatabaseName::Main, image.as_slice(), size, true)?;

        // Deserialization is lazy; touch the schema so garbage fails here.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        Ok(Self { conn })
    }

    /// Release the underlying connection.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::Close(e.to_string()))
    }
}

impl CollectionSource for SqliteCollection {
    fn read_models_blob(&self) -> Result<String> {
        let models: Option<Option<String>> = self
            .conn
            .query_row("SELECT models FROM col LIMIT 1", [], |row| row.get(0))
            .optional()?;
        models.flatten().ok_or(DbError::MissingConfig)
    }

    fn read_notes(&self, diagnostics: &mut ImportDiagnostics) -> Result<Vec<RawNote>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, mid, flds FROM notes ORDER BY id")?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            let note_id = row.get::<_, i64>(0).ok();
            let note = note_id
                .ok_or_else(|| "note id is not an integer".to_string())
                .and_then(|note_id| {
                    let model_id = row
                        .get::<_, i64>(1)
                        .map_err(|_| "model id is not an integer".to_string())?;
                    let fields_blob = match row.get_ref(2) {
                        Ok(ValueRef::Text(text)) | Ok(ValueRef::Blob(text)) => {
                            String::from_utf8_lossy(text).into_owned()
                        }
                        _ => return Err("field data is missing".to_string()),
                    };
                    Ok(RawNote {
                        note_id,
                        model_id,
                        fields_blob,
                    })
                });

            match note {
                Ok(note) => notes.push(note),
                Err(reason) => {
                    tracing::warn!(note_id = ?note_id, %reason, "skipping malformed note");
                    diagnostics.push(ImportWarning::MalformedNote { note_id, reason });
                }
            }
        }

        tracing::debug!(count = notes.len(), "read notes");
        Ok(notes)
    }
}
