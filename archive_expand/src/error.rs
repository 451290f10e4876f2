use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive parse error: {0}")]
    Parse(#[from] zip::result::ZipError),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
