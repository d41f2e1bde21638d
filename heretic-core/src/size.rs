use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Total size in bytes of the regular files beneath `path`.
///
/// This is an estimate. Symbolic links are neither followed nor counted, and
/// entries that cannot be read (permission denied, removed mid-walk) are
/// skipped, so the result is a partial sum when errors occur and `0` when
/// nothing could be read at all.
pub fn directory_size<P: AsRef<Path>>(path: P) -> u64 {
    let path = path.as_ref();

    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Size estimate skipping entry under {:?}: {}", path, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .fold(0u64, u64::saturating_add)
}
