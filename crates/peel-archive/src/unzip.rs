//! Replacing a zip archive with one of its members.
//!
//! The archive is read twice. The first pass walks the central directory and
//! lists, in directory order, the top-level entries whose lowercased name is
//! one of the requested members. The second pass re-opens the archive and,
//! for each listed name in turn, picks the entry carrying that name that comes
//! first in local-header order. Its bytes are copied into a scratch file,
//! which then replaces the archive.
//!
//! Sizes always come from the central directory, so entries whose sizes
//! trail their data in a data descriptor are read like any other.
//!
//! If an archive holds several entries that collide after lowercasing, the
//! two passes agree only when the archive lists them in the same order in its
//! central directory and its local headers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use peel_fs::ScratchFile;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::copy::{CopyError, copy_chunks};
use crate::error::{Error, Result};
use crate::options::UnpackOptions;

type Archive = ZipArchive<BufReader<File>>;

/// Replace the archive at `path` with the first member named in `members`.
///
/// Names are matched case-insensitively against top-level file entries.
/// Returns the (lowercased) name of the committed member, or `None` if the
/// archive holds none of them. The archive is left untouched on `None` and on
/// error.
pub fn extract_zip_member(
    path: impl AsRef<Path>,
    members: &[&str],
    options: &UnpackOptions,
) -> Result<Option<String>> {
    let path = path.as_ref();
    let wanted: Vec<String> = members.iter().map(|m| m.to_lowercase()).collect();

    let matches = find_members(&mut open_archive(path)?, &wanted)?;
    if matches.is_empty() {
        debug!(path = %path.display(), ?members, "no requested member in zip archive");
        return Ok(None);
    }

    let mut archive = open_archive(path)?;
    for name in &matches {
        let Some(index) = first_in_stream_order(&mut archive, name)? else {
            debug!(path = %path.display(), member = %name, "member missing on second pass");
            continue;
        };

        let mut scratch = ScratchFile::beside(path, options.replace_options())?;
        let mut entry = archive.by_index(index)?;
        let bytes = copy_chunks(&mut entry, &mut scratch, options.get_buffer_size()).map_err(
            |e| match e {
                CopyError::Read(source) => Error::Decode {
                    path: path.to_path_buf(),
                    source,
                },
                CopyError::Write(source) => Error::Io {
                    path: scratch.path().to_path_buf(),
                    source,
                },
            },
        )?;
        drop(entry);

        scratch.commit()?;
        debug!(path = %path.display(), member = %name, bytes, "replaced zip archive with member");
        return Ok(Some(name.clone()));
    }

    Err(Error::MemberVanished {
        name: matches.join(", "),
    })
}

/// [`extract_zip_member`] with default options, reporting only success.
pub fn unpack_zip(path: impl AsRef<Path>, members: &[&str]) -> bool {
    unpack_zip_with(path, members, &UnpackOptions::default())
}

pub fn unpack_zip_with(path: impl AsRef<Path>, members: &[&str], options: &UnpackOptions) -> bool {
    let path = path.as_ref();
    match extract_zip_member(path, members, options) {
        Ok(found) => found.is_some(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to unpack zip archive");
            false
        }
    }
}

/// Lowercased names of requested top-level files, in central-directory order.
fn find_members(archive: &mut Archive, wanted: &[String]) -> Result<Vec<String>> {
    let mut found = Vec::new();

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_lowercase();
        if name.contains('/') || !wanted.contains(&name) || found.contains(&name) {
            continue;
        }
        found.push(name);
    }

    Ok(found)
}

/// Index of the entry named `name` whose local header comes first.
fn first_in_stream_order(archive: &mut Archive, name: &str) -> Result<Option<usize>> {
    let mut best: Option<(u64, usize)> = None;

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.is_dir() || entry.name().to_lowercase() != name {
            continue;
        }
        let offset = entry.header_start();
        if best.is_none_or(|(start, _)| offset < start) {
            best = Some((offset, index));
        }
    }

    Ok(best.map(|(_, index)| index))
}

fn open_archive(path: &Path) -> Result<Archive> {
    let file = File::open(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}
