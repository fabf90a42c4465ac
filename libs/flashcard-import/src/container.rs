//! Package archive access.
//!
//! A package is a zip archive holding the collection database under one of
//! two names, an optional `media` manifest, and media blobs named by number.

use crate::error::{ImportError, Result};
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// Collection database entry written by current exporters.
pub const DATABASE_ENTRY: &str = "collection.anki21";

/// Collection database entry written by older exporters.
pub const LEGACY_DATABASE_ENTRY: &str = "collection.anki2";

/// Media manifest entry.
pub const MEDIA_MANIFEST_ENTRY: &str = "media";

/// Read-only view over the package archive.
pub struct PackageContainer<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    database_entry: &'static str,
}

impl<'a> PackageContainer<'a> {
    /// Open a package, failing if it carries no collection database.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;

        let database_entry = [DATABASE_ENTRY, LEGACY_DATABASE_ENTRY]
            .into_iter()
            .find(|candidate| archive.file_names().any(|name| name == *candidate))
            .ok_or_else(|| {
                ImportError::InvalidContainer(format!(
                    "neither {DATABASE_ENTRY} nor {LEGACY_DATABASE_ENTRY} found"
                ))
            })?;

        tracing::debug!(
            entry = database_entry,
            entries = archive.len(),
            "opened package container"
        );

        Ok(Self {
            archive,
            database_entry,
        })
    }

    /// Name of the collection database entry that was found.
    pub fn database_entry(&self) -> &'static str {
        self.database_entry
    }

    /// Read an entry by name. Returns `None` if it does not exist.
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer).map_err(|e| {
            ImportError::InvalidContainer(format!("failed to read entry {name}: {e}"))
        })?;
        Ok(Some(buffer))
    }

    /// Read the collection database bytes.
    pub fn read_database(&mut self) -> Result<Vec<u8>> {
        let entry = self.database_entry;
        self.read_entry(entry)?.ok_or_else(|| {
            ImportError::InvalidContainer(format!("database entry {entry} is unreadable"))
        })
    }

    /// Names of every entry in the archive.
    pub fn list_entries(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }
}
