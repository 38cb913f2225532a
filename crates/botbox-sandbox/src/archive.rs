//! Reading agent submission archives and repacking them as tar streams
//! for container file injection.
//!
//! Only ZIP is concretely supported — the original service's own format
//! dispatch never grew a second branch beyond ZIP, so this one doesn't
//! either. Detecting and rejecting other formats is a documented gap,
//! not an oversight.

use std::io::{Cursor, Read};

use crate::error::ArchiveError;

/// Permission bits applied to every file written into a container's tar
/// stream: readable and executable by anyone, writable by no one.
const ARCHIVE_PERMISSIONS: u32 = 0o555;

/// One file extracted from a submitted archive.
pub struct ArchiveFile {
    pub name: String,
    pub reader: Box<dyn Read + Send>,
}

/// A readable agent submission. `files` consumes the archive — call it
/// once.
pub trait Archive: Send {
    fn files(&mut self) -> Result<Vec<ArchiveFile>, ArchiveError>;
}

/// A ZIP-backed [`Archive`], the only format this crate reads.
pub struct ZipArchive {
    bytes: Vec<u8>,
}

impl ZipArchive {
    fn open(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        // Fail fast on anything that isn't even a valid ZIP central
        // directory, rather than discovering it lazily in `files`.
        zip::ZipArchive::new(Cursor::new(&bytes)).map_err(ArchiveError::Zip)?;
        Ok(Self { bytes })
    }
}

impl Archive for ZipArchive {
    fn files(&mut self) -> Result<Vec<ArchiveFile>, ArchiveError> {
        let mut zip = zip::ZipArchive::new(Cursor::new(&self.bytes)).map_err(ArchiveError::Zip)?;
        let mut out = Vec::with_capacity(zip.len());

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(ArchiveError::Zip)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            out.push(ArchiveFile {
                name,
                reader: Box::new(Cursor::new(buf)),
            });
        }

        Ok(out)
    }
}

/// Sniffs `bytes` and constructs the matching concrete [`Archive`].
///
/// Only the ZIP local-file-header magic (`PK\x03\x04`) is recognized.
/// Anything else is [`ArchiveError::UnsupportedFormat`] — the in-scope
/// equivalent of the original's unreachable "please use a valid archive
/// type" branch.
pub fn open_archive(bytes: Vec<u8>) -> Result<Box<dyn Archive>, ArchiveError> {
    if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
        Ok(Box::new(ZipArchive::open(bytes)?))
    } else {
        Err(ArchiveError::UnsupportedFormat)
    }
}

/// Reads every file out of `archive` and writes them into a tar byte
/// stream, ready for the Docker Engine API's copy-to-container call.
pub fn archive_to_tar(archive: &mut dyn Archive) -> Result<Vec<u8>, ArchiveError> {
    let files = archive.files()?;
    let mut builder = tar::Builder::new(Vec::new());

    for mut file in files {
        let mut data = Vec::new();
        file.reader.read_to_end(&mut data)?;

        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(ARCHIVE_PERMISSIONS);
        header.set_cksum();
        builder
            .append_data(&mut header, &file.name, data.as_slice())
            .map_err(ArchiveError::Io)?;
    }

    builder.into_inner().map_err(ArchiveError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::FileOptions::default();
            for (name, data) in files {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_open_archive_rejects_non_zip_bytes() {
        let result = open_archive(b"not a zip file".to_vec());
        assert!(matches!(result, Err(ArchiveError::UnsupportedFormat)));
    }

    #[test]
    fn test_zip_archive_lists_files() {
        let bytes = build_zip(&[("run.sh", b"echo hi"), ("bot.py", b"print(1)")]);
        let mut archive = open_archive(bytes).unwrap();
        let mut files = archive.files().unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "bot.py");
        assert_eq!(files[1].name, "run.sh");
    }

    #[test]
    fn test_zip_archive_skips_directory_entries() {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::FileOptions::default();
            writer.add_directory("subdir/", options).unwrap();
            writer.start_file("subdir/run.sh", options).unwrap();
            writer.write_all(b"echo hi").unwrap();
            writer.finish().unwrap();
        }

        let mut archive = open_archive(buf).unwrap();
        let files = archive.files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "subdir/run.sh");
    }

    #[test]
    fn test_archive_to_tar_preserves_file_contents() {
        let bytes = build_zip(&[("run.sh", b"echo hi")]);
        let mut archive = open_archive(bytes).unwrap();
        let tar_bytes = archive_to_tar(archive.as_mut()).unwrap();

        let mut reader = tar::Archive::new(Cursor::new(tar_bytes));
        let mut entries = reader.entries().unwrap();
        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_str().unwrap(), "run.sh");
        assert_eq!(entry.header().mode().unwrap(), ARCHIVE_PERMISSIONS);

        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "echo hi");
    }
}
