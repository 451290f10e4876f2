use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use archive_expand::{ArchiveError, ZipExpander};
use tracing::{info, warn};

use crate::source::UploadSource;

/// An archive that could not be expanded. Reported alongside the batch
/// result; never fatal to sibling sources.
#[derive(Debug)]
pub struct SkippedArchive {
    pub name: Arc<str>,
    pub error: ArchiveError,
}

fn is_archive(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Expands a raw selection into the flat list of files to upload.
///
/// `.zip` sources are replaced in place by their extracted entries. A source
/// whose archive cannot be parsed is recorded as skipped, contributing zero
/// entries; the sibling sources are unaffected.
pub fn expand_selection(inputs: Vec<UploadSource>) -> (Vec<UploadSource>, Vec<SkippedArchive>) {
    let mut sources = Vec::with_capacity(inputs.len());
    let mut skipped = Vec::new();

    for input in inputs {
        if !is_archive(&input.name) {
            sources.push(input);
            continue;
        }

        let mut expander = match ZipExpander::open(Cursor::new(input.data.clone())) {
            Ok(expander) => expander,
            Err(e) => {
                warn!("Skipping archive {}: {e}", input.name);
                skipped.push(SkippedArchive {
                    name: input.name,
                    error: e,
                });
                continue;
            },
        };

        let mut n_extracted = 0;
        let mut archive_error = None;

        for entry in expander.entries() {
            match entry {
                Ok(entry) => {
                    sources.push(UploadSource::new(entry.name, entry.data));
                    n_extracted += 1;
                },
                Err(e) => {
                    // A bad entry invalidates the whole archive; nothing of
                    // it is uploaded.
                    archive_error = Some(e);
                    break;
                },
            }
        }

        match archive_error {
            Some(e) => {
                warn!("Skipping archive {}: {e}", input.name);
                sources.truncate(sources.len() - n_extracted);
                skipped.push(SkippedArchive {
                    name: input.name,
                    error: e,
                });
            },
            None => {
                info!("Expanded archive {} into {n_extracted} entries.", input.name);
            },
        }
    }

    (sources, skipped)
}
