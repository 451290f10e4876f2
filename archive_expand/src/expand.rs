use std::io::{Read, Seek};
use std::path::Path;

use bytes::Bytes;
use tracing::debug;
use zip::ZipArchive;

use crate::error::Result;

/// Extensions extracted from an archive. Everything else is skipped.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// One extracted archive entry held in memory.
#[derive(Clone, Debug)]
pub struct ExtractedEntry {
    /// Path of the entry inside the archive.
    pub name: String,

    pub data: Bytes,
}

/// Walks a zip archive, extracting the entries worth uploading into
/// in-memory [`ExtractedEntry`]s.
///
/// Extraction is lazy, one entry per iterator step. Directory entries,
/// nested archives, and entries outside the extension allow-list are
/// skipped; nested archives are never recursed into.
pub struct ZipExpander<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipExpander<R> {
    /// Parses the archive's central directory. Fails if the input is not a
    /// readable zip.
    pub fn open(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Raw entry count of the archive, skipped entries included.
    pub fn n_entries(&self) -> usize {
        self.archive.len()
    }

    /// Lazy sequence of the extracted entries.
    pub fn entries(&mut self) -> Entries<'_, R> {
        Entries {
            expander: self,
            next_index: 0,
        }
    }
}

fn entry_extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|ext| ext.to_str())
}

fn extension_allowed(name: &str) -> bool {
    entry_extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
}

fn is_nested_archive(name: &str) -> bool {
    entry_extension(name).is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

pub struct Entries<'a, R: Read + Seek> {
    expander: &'a mut ZipExpander<R>,
    next_index: usize,
}

impl<R: Read + Seek> Iterator for Entries<'_, R> {
    type Item = Result<ExtractedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.next_index >= self.expander.archive.len() {
                return None;
            }

            let index = self.next_index;
            self.next_index += 1;

            let mut entry = match self.expander.archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_owned();

            if is_nested_archive(&name) {
                debug!("Skipping nested archive entry {name}; not recursing.");
                continue;
            }
            if !extension_allowed(&name) {
                debug!("Skipping entry {name}: extension not in allow-list.");
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut data) {
                return Some(Err(e.into()));
            }

            return Some(Ok(ExtractedEntry {
                name,
                data: data.into(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(name.trim_end_matches('/'), options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }

        writer.finish().unwrap().into_inner()
    }

    fn expand_all(zip_bytes: Vec<u8>) -> Vec<ExtractedEntry> {
        let mut expander = ZipExpander::open(Cursor::new(zip_bytes)).unwrap();
        expander.entries().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_extracts_allowed_extensions() {
        let entries = expand_all(build_zip(&[
            ("report.pdf", b"pdf data"),
            ("notes.txt", b"txt data"),
            ("readme.md", b"md data"),
        ]));

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "report.pdf");
        assert_eq!(entries[0].data, Bytes::from_static(b"pdf data"));
    }

    #[test]
    fn test_skips_directories_and_disallowed_extensions() {
        let entries = expand_all(build_zip(&[
            ("docs/", b""),
            ("docs/report.pdf", b"pdf data"),
            ("image.png", b"png data"),
            ("binary", b"no extension"),
        ]));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "docs/report.pdf");
    }

    #[test]
    fn test_nested_archives_are_not_recursed() {
        let inner = build_zip(&[("inner.txt", b"inner data")]);
        let entries = expand_all(build_zip(&[("nested.zip", &inner), ("outer.txt", b"outer data")]));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "outer.txt");
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let entries = expand_all(build_zip(&[("REPORT.PDF", b"pdf data")]));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corrupt_archive_fails_to_open() {
        assert!(ZipExpander::open(Cursor::new(b"this is not a zip file".to_vec())).is_err());
    }

    #[test]
    fn test_empty_entry_extracted() {
        let entries = expand_all(build_zip(&[("empty.txt", b"")]));
        assert_eq!(entries.len(), 1);
        assert!(entries[0].data.is_empty());
    }
}
