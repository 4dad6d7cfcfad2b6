//! Local backup of the toggle set. Two independent artifacts are kept: the serialized toggle set
//! and a plain-text etag file. Both are written by the fetch task and read once at cold start.
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::{Error, Result, ToggleSet};

/// Minimal filesystem abstraction used for backup files.
pub trait FileSystem: Send + Sync {
    /// Create (or truncate) a file for writing.
    fn open_create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Open an existing file for reading.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Replace file contents with `text`.
    fn write_all_text(&self, path: &Path, text: &str) -> io::Result<()>;

    /// Read the whole file as a string.
    fn read_all_text(&self, path: &Path) -> io::Result<String>;

    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn open_create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn write_all_text(&self, path: &Path, text: &str) -> io::Result<()> {
        std::fs::write(path, text)
    }

    fn read_all_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Encodes toggle sets into the backup artifact and back.
pub trait ToggleSerializer: Send + Sync {
    fn serialize(&self, writer: &mut dyn Write, toggles: &ToggleSet) -> Result<()>;

    fn deserialize(&self, reader: &mut dyn Read) -> Result<ToggleSet>;
}

/// JSON encoding, same shape as the remote API response.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl ToggleSerializer for JsonSerializer {
    fn serialize(&self, writer: &mut dyn Write, toggles: &ToggleSet) -> Result<()> {
        serde_json::to_writer(&mut *writer, toggles)?;
        // BufWriter swallows errors on drop, so flush explicitly to surface them.
        writer.flush()?;
        Ok(())
    }

    fn deserialize(&self, reader: &mut dyn Read) -> Result<ToggleSet> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Serialize `toggles` into a freshly created file at `path`.
pub fn write_toggles(
    fs: &dyn FileSystem,
    serializer: &dyn ToggleSerializer,
    path: &Path,
    toggles: &ToggleSet,
) -> Result<()> {
    let mut writer = fs.open_create(path)?;
    serializer.serialize(&mut writer, toggles)
}

/// State restored from local storage at cold start.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Backup {
    pub toggles: ToggleSet,
    /// Etag matching `toggles`, or an empty string if unknown.
    pub etag: String,
}

/// Load the backup written by previous runs.
///
/// Never fails: missing or unreadable artifacts yield an empty toggle set and/or an empty etag.
/// If the toggle file cannot be read, the etag is discarded too, so that the next fetch downloads
/// the full toggle set instead of being told that nothing changed.
pub fn load_backup(
    fs: &dyn FileSystem,
    serializer: &dyn ToggleSerializer,
    toggle_file: &Path,
    etag_file: &Path,
) -> Backup {
    let toggles = if fs.exists(toggle_file) {
        let loaded = fs
            .open_read(toggle_file)
            .map_err(Error::from)
            .and_then(|mut reader| serializer.deserialize(&mut reader));
        match loaded {
            Ok(toggles) => Some(toggles),
            Err(err) => {
                log::error!(target: "toggle", path:display = toggle_file.display(); "failed to load toggle backup: {err}");
                None
            }
        }
    } else {
        log::debug!(target: "toggle", path:display = toggle_file.display(); "no toggle backup found");
        Some(ToggleSet::default())
    };

    let Some(toggles) = toggles else {
        return Backup::default();
    };

    let etag = if fs.exists(etag_file) {
        match fs.read_all_text(etag_file) {
            Ok(etag) => etag.trim().to_owned(),
            Err(err) => {
                log::warn!(target: "toggle", path:display = etag_file.display(); "failed to read etag backup: {err}");
                String::new()
            }
        }
    } else {
        String::new()
    };

    log::debug!(target: "toggle", toggles = toggles.len(), etag:display = etag; "loaded toggle backup");

    Backup { toggles, etag }
}
