//! # Archive Sources
//!
//! Trait seam over entry-enumerable archive containers. The engine only
//! needs ordered entry names and a per-entry byte copy; the ZIP
//! implementation below is the only one today.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Entry-enumerable byte-stream container.
pub trait ArchiveSource {
    /// File entry names in stored order; directory entries are skipped.
    fn entry_names(&mut self) -> Result<Vec<String>, ArchiveError>;

    /// Copy one entry's bytes into `dest`, returning the byte count.
    fn copy_entry(&mut self, name: &str, dest: &mut dyn Write) -> Result<u64, ArchiveError>;
}

pub struct ZipSource {
    archive: zip::ZipArchive<File>,
}

impl ZipSource {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let archive = zip::ZipArchive::new(file)?;
        Ok(Self { archive })
    }
}

impl ArchiveSource for ZipSource {
    fn entry_names(&mut self) -> Result<Vec<String>, ArchiveError> {
        // Central-directory order keeps collision suffixes deterministic;
        // ZipArchive::file_names() iterates in hash-map order.
        let mut names = Vec::with_capacity(self.archive.len());
        for idx in 0..self.archive.len() {
            let entry = self.archive.by_index_raw(idx)?;
            if !entry.is_dir() {
                names.push(entry.name().to_string());
            }
        }
        Ok(names)
    }

    fn copy_entry(&mut self, name: &str, dest: &mut dyn Write) -> Result<u64, ArchiveError> {
        let mut entry = self.archive.by_name(name)?;
        Ok(io::copy(&mut entry, dest)?)
    }
}

pub fn open_archive(path: &Path) -> Result<Box<dyn ArchiveSource>, ArchiveError> {
    let src = ZipSource::open(path)?;
    Ok(Box::new(src))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use zip::write::FileOptions;

    /// Build a ZIP fixture from (name, contents) pairs.
    pub(crate) fn write_zip(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(file_name);
        let file = File::create(&path).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(*name, FileOptions::default())
                .expect("start entry");
            writer.write_all(data).expect("write entry");
        }
        writer.finish().expect("finish zip");
        path
    }

    #[test]
    fn lists_file_entries_in_stored_order() {
        let dir = tempdir().expect("tempdir");
        let zip_path = write_zip(
            dir.path(),
            "fixture.zip",
            &[("b.txt", b"bee"), ("a/one.txt", b"one"), ("a/two.txt", b"two")],
        );

        let mut source = ZipSource::open(&zip_path).expect("open zip");
        let names = source.entry_names().expect("names");
        assert_eq!(names, vec!["b.txt", "a/one.txt", "a/two.txt"]);
    }

    #[test]
    fn skips_directory_entries() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("dirs.zip");
        let file = File::create(&path).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .add_directory("folder/", FileOptions::default())
            .expect("add dir");
        writer
            .start_file("folder/data.bin", FileOptions::default())
            .expect("start entry");
        writer.write_all(b"payload").expect("write entry");
        writer.finish().expect("finish zip");

        let mut source = ZipSource::open(&path).expect("open zip");
        assert_eq!(source.entry_names().expect("names"), vec!["folder/data.bin"]);
    }

    #[test]
    fn copies_entry_bytes() {
        let dir = tempdir().expect("tempdir");
        let zip_path = write_zip(dir.path(), "copy.zip", &[("note.txt", b"hello world")]);

        let mut source = ZipSource::open(&zip_path).expect("open zip");
        let mut out = Vec::new();
        let copied = source.copy_entry("note.txt", &mut out).expect("copy");
        assert_eq!(copied, 11);
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn open_fails_for_non_zip_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("not_a_zip.txt");
        std::fs::write(&path, b"plain text").expect("write file");
        assert!(ZipSource::open(&path).is_err());
    }
}
