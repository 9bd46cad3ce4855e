use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

/// Number of leading bytes the classifier ever looks at.
pub const SNIFF_LEN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Unknown,
    Zip,
    GZip,
    /// Binary metadata files starting with `0xE0` or `0x0E`. Opaque here.
    LegacyMetadata,
    Text,
}

impl FileKind {
    pub fn is_archive(self) -> bool { matches!(self, Self::Zip | Self::GZip) }
}

pub fn classify(head: &[u8]) -> FileKind {
    let head = &head[..head.len().min(SNIFF_LEN)];

    match head {
        [] | [_] => FileKind::Unknown,
        [b'P', b'K', ..] => FileKind::Zip,
        [0x1F, 0x8B, ..] => FileKind::GZip,
        [0xE0 | 0x0E, ..] => FileKind::LegacyMetadata,
        _ if head.iter().all(|&b| is_printable(b) || is_space(b)) => FileKind::Text,
        _ => FileKind::Unknown,
    }
}

fn is_printable(b: u8) -> bool { (0x20..=0x7E).contains(&b) }

fn is_space(b: u8) -> bool { matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r') }

pub fn sniff_reader<R: Read>(reader: R) -> io::Result<FileKind> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    reader.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(classify(&head))
}

/// Classify the file at `path`. Unreadable files are [`FileKind::Unknown`].
pub fn sniff(path: impl AsRef<Path>) -> FileKind {
    let path = path.as_ref();
    let kind = File::open(path).and_then(sniff_reader);

    match kind {
        Ok(kind) => {
            debug!(path = %path.display(), ?kind, "classified file");
            kind
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read file header");
            FileKind::Unknown
        }
    }
}
