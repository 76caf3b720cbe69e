// src/store/persistence.rs
//! Atomic whole-store persistence
//!
//! The store is loaded and saved as one unit. Saving writes the full
//! document to a temporary file in the destination directory and atomically
//! renames it over the target, so a failed save leaves the on-disk file
//! unchanged. Loading parses and validates before constructing the store, so
//! a failed load has no side effects.

use crate::channel::Channel;
use crate::config::constants::store::FORMAT_VERSION;
use crate::error::{Error, Result};
use crate::store::{ChannelStore, HistoryEntry};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    duration_s: f64,
    history: &'a [HistoryEntry],
    channels: Vec<&'a Channel>,
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    duration_s: f64,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    channels: Vec<Channel>,
}

/// Load a persisted store
pub fn load(path: impl AsRef<Path>) -> Result<ChannelStore> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|_| Error::NotFound(format!("store file '{}'", path.display())))?;
    let document: Document = serde_json::from_reader(BufReader::new(file))?;

    if document.version > FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "store format version {} is newer than supported version {}",
            document.version, FORMAT_VERSION
        )));
    }

    debug!(
        path = %path.display(),
        channels = document.channels.len(),
        "store loaded"
    );
    Ok(ChannelStore::from_parts(
        document.channels,
        document.history,
        document.duration_s,
    ))
}

/// Save a store atomically, replacing any existing file
pub fn save(store: &ChannelStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());

    let (channels, history, duration_s) = store.parts_ref();
    let document = DocumentRef {
        version: FORMAT_VERSION,
        duration_s,
        history,
        channels,
    };

    // Write to a sibling temp file, then swap; the rename is what makes the
    // save atomic, so the temp file must live on the same filesystem
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;
    }
    tmp.persist(path)
        .map_err(|e| Error::Persistence(format!("atomic rename failed: {}", e)))?;

    debug!(path = %path.display(), channels = store.channel_count(), "store saved");
    Ok(())
}
