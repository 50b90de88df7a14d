use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::sold_item::SoldItem;

use super::codec;

/// Directory (relative to the working directory) holding the ledger.
pub const DEFAULT_DATA_DIR: &str = "data";

/// File name of the ledger inside the data directory.
pub const DEFAULT_FILE_NAME: &str = "loppiskassan.csv";

/// Number of round-robin backup slots (`<file>.backup.0` .. `.backup.9`).
pub const BACKUP_SLOTS: usize = 10;

/// The CSV ledger on disk.
///
/// New sales are appended. Destructive rewrites (payout, import, clear) go
/// through [`FileStore::rotate_backup`] first so the previous generation is
/// kept in one of the backup slots.
///
/// There is no locking: a single running till is assumed per file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    next_backup: usize,
}

impl FileStore {
    /// Store at `path`, with the first backup slot chosen at random.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_backup: random_slot(),
        }
    }

    /// Store at `path` whose first rotation goes to `slot`.
    pub fn with_backup_start(path: impl Into<PathBuf>, slot: usize) -> Self {
        Self {
            path: path.into(),
            next_backup: slot % BACKUP_SLOTS,
        }
    }

    /// Store using the default file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Slot the next rotation will write to.
    pub fn next_backup_slot(&self) -> usize {
        self.next_backup
    }

    pub fn backup_path(&self, slot: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".backup.{slot}"));
        PathBuf::from(name)
    }

    /// Append items to the ledger, writing the header first if the file is
    /// new or empty. Creates the file (and its directory) if needed.
    pub fn append(&self, items: &[SoldItem]) -> Result<(), CoreError> {
        self.ensure_parent_dir()?;

        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let text = codec::encode(items, needs_header)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;

        debug!(path = %self.path.display(), rows = items.len(), "Appended ledger rows");
        Ok(())
    }

    /// Full ledger text with `#` comment lines removed.
    /// A missing file reads as an empty string.
    pub fn read_all(&self) -> Result<String, CoreError> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let mut text = String::with_capacity(raw.len());
        for line in raw.lines().filter(|l| !l.starts_with('#')) {
            text.push_str(line);
            text.push('\n');
        }
        Ok(text)
    }

    /// Read and decode the whole ledger. Malformed rows are skipped.
    pub fn load(&self) -> Result<Vec<SoldItem>, CoreError> {
        let text = self.read_all()?;
        Ok(codec::decode(&text, true))
    }

    /// Move the live file into the next backup slot, replacing whatever was
    /// there. The slot index advances on every call. Returns the backup
    /// path, or `None` if there was no live file.
    pub fn rotate_backup(&mut self) -> Result<Option<PathBuf>, CoreError> {
        let slot = self.next_backup;
        self.next_backup = (slot + 1) % BACKUP_SLOTS;

        if !self.path.exists() {
            return Ok(None);
        }

        let target = self.backup_path(slot);
        // rename replaces an existing target on Unix but not on Windows
        if cfg!(windows) && target.exists() {
            fs::remove_file(&target)?;
        }
        fs::rename(&self.path, &target)?;

        info!(backup = %target.display(), "Rotated ledger into backup slot {slot}");
        Ok(Some(target))
    }

    /// Copy the live file byte for byte into the next backup slot. The live
    /// ledger is left untouched. Returns `None` if there was no live file.
    pub fn copy_to_backup(&mut self) -> Result<Option<PathBuf>, CoreError> {
        let slot = self.next_backup;
        self.next_backup = (slot + 1) % BACKUP_SLOTS;

        if !self.path.exists() {
            return Ok(None);
        }

        let target = self.backup_path(slot);
        fs::copy(&self.path, &target)?;

        info!(backup = %target.display(), "Copied ledger into backup slot {slot}");
        Ok(Some(target))
    }

    /// Replace the ledger with `items`, keeping the old file as a backup.
    pub fn overwrite(&mut self, items: &[SoldItem]) -> Result<Option<PathBuf>, CoreError> {
        let backup = self.rotate_backup()?;
        self.ensure_parent_dir()?;

        let text = codec::encode(items, true)?;
        let mut file = File::create(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;

        info!(path = %self.path.display(), rows = items.len(), "Rewrote ledger");
        Ok(backup)
    }

    /// Remove all sales. The ledger is moved into a backup slot, never deleted.
    pub fn clear_all(&mut self) -> Result<Option<PathBuf>, CoreError> {
        self.rotate_backup()
    }

    /// Advisory pre-check before a mutating action: an existing ledger must
    /// be both readable and writable. Not a lock.
    pub fn check_access(&self) -> Result<(), CoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map(|_| ())
            .map_err(|e| CoreError::AccessDenied(format!("{}: {e}", self.path.display())))
    }

    fn ensure_parent_dir(&self) -> Result<(), CoreError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir)?),
            _ => Ok(()),
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::in_dir(DEFAULT_DATA_DIR)
    }
}

fn random_slot() -> usize {
    let mut buf = [0u8; 1];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => usize::from(buf[0]) % BACKUP_SLOTS,
        Err(_) => 0,
    }
}
