use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::errors::Result;

/// An in-memory file staged for upload, either selected directly or
/// extracted from an archive.
#[derive(Clone, Debug)]
pub struct UploadSource {
    pub name: Arc<str>,
    pub data: Bytes,
}

impl UploadSource {
    pub fn new(name: impl Into<Arc<str>>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Stages a file from disk, named by its file name component.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        let name: Arc<str> = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.into(),
            None => path.to_string_lossy().into_owned().into(),
        };

        Ok(Self { name, data: data.into() })
    }

    pub fn n_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");

        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"on disk").unwrap();

        let source = UploadSource::from_file(&path).unwrap();
        assert_eq!(&*source.name, "notes.txt");
        assert_eq!(source.data, Bytes::from_static(b"on disk"));
        assert_eq!(source.n_bytes(), 7);
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        assert!(UploadSource::from_file("/nonexistent/nope.txt").is_err());
    }
}
