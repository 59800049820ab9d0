//! Read access to zip-format archives (war and jar files).

use crate::manifest::Manifest;
use crate::ArchiveError;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// Location of the manifest inside a jar.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// An entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full path inside the archive
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// An open archive on disk.
pub struct HostArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl HostArchive {
    /// Open the archive at `path`.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        if !path.exists() {
            return Err(ArchiveError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let zip = ZipArchive::new(file)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List every entry in archive order.
    pub fn entries(&self) -> Vec<ArchiveEntry> {
        self.zip
            .file_names()
            .map(|name| ArchiveEntry {
                name: name.to_string(),
                is_dir: name.ends_with('/'),
            })
            .collect()
    }

    /// Read the full contents of an entry.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut entry = self.zip.by_name(name)?;
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Open `bytes` as a nested jar and parse its manifest, if it has one.
pub fn read_manifest(bytes: &[u8]) -> Result<Option<Manifest>, ArchiveError> {
    let mut jar = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = match jar.by_name(MANIFEST_PATH) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut raw = Vec::new();
    entry.read_to_end(&mut raw)?;
    Ok(Some(Manifest::parse(&String::from_utf8_lossy(&raw))))
}
