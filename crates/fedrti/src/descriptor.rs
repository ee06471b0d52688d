// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federation descriptor files handed to the broker at create time.
//!
//! A descriptor either belongs to the user (never deleted) or was written
//! by this process from inline contents (deleted on drop). The distinction
//! is an explicit flag, not a property of the file name.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct DescriptorFile {
    path: PathBuf,
    owned: bool,
}

impl DescriptorFile {
    /// Reference a user-supplied descriptor. The file is left alone on drop.
    pub fn user(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    /// Write `contents` to a fresh temporary file owned by this process.
    pub fn temporary(contents: &str) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("fedrti-descriptor-")
            .suffix(".json")
            .tempfile()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        let (_, path) = file.keep()?;
        log::debug!("[descriptor] wrote temporary {}", path.display());
        Ok(Self { path, owned: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if dropping this value deletes the file.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Identifier sent in CREATE_FEDERATION_EXECUTION.
    pub fn identifier(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn read_to_string(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

impl Drop for DescriptorFile {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!(
                "[descriptor] failed to remove {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_file_removed_on_drop() {
        let descriptor = DescriptorFile::temporary("{\"objects\": []}").unwrap();
        let path = descriptor.path().to_path_buf();
        assert!(descriptor.is_owned());
        assert_eq!(descriptor.read_to_string().unwrap(), "{\"objects\": []}");
        drop(descriptor);
        assert!(!path.exists());
    }

    #[test]
    fn test_user_file_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        // A user file that happens to look like a temporary one.
        let path = dir.path().join("fedrti-descriptor-mine.json");
        fs::write(&path, "{}").unwrap();

        let descriptor = DescriptorFile::user(&path);
        assert!(!descriptor.is_owned());
        drop(descriptor);
        assert!(path.exists());
    }
}
