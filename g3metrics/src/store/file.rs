/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use g3_metric_model::Metric;

use super::{CodecError, SnapshotReader, encode_line};

/// Owner of the snapshot file.
///
/// Records are appended through a handle opened in append mode. Full
/// rewrites go through a temporary sibling which is renamed over the
/// snapshot, so readers always find a complete file.
pub struct FileStore {
    path: PathBuf,
    file: Option<File>,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn write_or_rollback<W, F>(writer: &mut W, data: &[u8], rollback: F) -> io::Result<()>
where
    W: Write,
    F: FnOnce(&mut W) -> io::Result<()>,
{
    let Err(e) = writer.write_all(data) else {
        return Ok(());
    };
    if let Err(re) = rollback(writer) {
        warn!("failed to roll back partial write: {re}");
    }
    Err(e)
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "snapshot file has been closed")
}

impl FileStore {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let file = open_append(path)?;
        Ok(FileStore {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(closed_error)
    }

    /// Append one record, as a single write of one full line.
    ///
    /// A failed write is cut back to the previous file length, so no partial
    /// line is left in front of the next record.
    pub fn append(&mut self, metric: &Metric) -> Result<(), CodecError> {
        let line = encode_line(metric)?;
        let file = self.file_mut()?;
        let len = file.metadata()?.len();
        write_or_rollback(file, &line, |f| f.set_len(len))?;
        Ok(())
    }

    pub fn truncate(&mut self) -> io::Result<()> {
        self.file_mut()?.set_len(0)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| OsString::from("snapshot"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_tmp(tmp: &Path, records: &[Metric]) -> Result<(), CodecError> {
        let file = File::create(tmp)?;
        let mut writer = BufWriter::new(file);
        for metric in records {
            writer.write_all(&encode_line(metric)?)?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// Replace the whole snapshot with `records`.
    ///
    /// On failure the old snapshot stays in place.
    pub fn replace_all(&mut self, records: &[Metric]) -> Result<(), CodecError> {
        if self.is_closed() {
            return Err(CodecError::Io(closed_error()));
        }

        let tmp = self.tmp_path();
        if let Err(e) = FileStore::write_tmp(&tmp, records) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        // the append handle must not be open while renaming on windows
        self.file = None;
        let renamed = fs::rename(&tmp, &self.path);
        self.file = Some(open_append(&self.path)?);
        if let Err(e) = renamed {
            let _ = fs::remove_file(&tmp);
            return Err(CodecError::Io(e));
        }
        self.sync_dir();
        Ok(())
    }

    #[cfg(unix)]
    fn sync_dir(&self) {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && let Err(e) = File::open(dir).and_then(|d| d.sync_all())
        {
            warn!("failed to sync dir {}: {e}", dir.display());
        }
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) {}

    /// Flush and release the file handle. Closing twice is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }
}

/// Open the snapshot at `path` for reading, `None` if it does not exist.
pub fn read_all(path: &Path) -> io::Result<Option<SnapshotReader<BufReader<File>>>> {
    match File::open(path) {
        Ok(file) => Ok(Some(SnapshotReader::new(BufReader::new(file)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
