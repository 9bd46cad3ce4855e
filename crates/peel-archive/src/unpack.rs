use std::path::Path;

use tracing::debug;

use crate::detect::{FileKind, sniff};
use crate::options::UnpackOptions;

/// Result of unpacking a file in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnpackOutcome {
    /// At least one archive layer was unpacked and committed.
    pub succeeded: bool,
    /// Classification of the file at the last step.
    pub kind:      FileKind,
}

impl UnpackOutcome {
    pub fn new(succeeded: bool, kind: FileKind) -> Self { Self { succeeded, kind } }
}

/// Classify `path` and, if it is a zip or gzip file, unpack that single layer.
///
/// `kind` is the classification before unpacking; `succeeded` tells whether
/// this one step committed.
pub fn unpack_once(path: impl AsRef<Path>, members: &[&str], options: &UnpackOptions) -> UnpackOutcome {
    let path = path.as_ref();
    let kind = sniff(path);

    let succeeded = match kind {
        FileKind::Zip => unzip_layer(path, members, options),
        FileKind::GZip => gunzip_layer(path, options),
        FileKind::Unknown | FileKind::LegacyMetadata | FileKind::Text => false,
    };

    UnpackOutcome { succeeded, kind }
}

/// Peel every archive layer off `path`, in place.
pub fn unpack_archive(path: impl AsRef<Path>, members: &[&str]) -> UnpackOutcome {
    unpack_archive_with(path, members, &UnpackOptions::default())
}

pub fn unpack_archive_with(
    path: impl AsRef<Path>,
    members: &[&str],
    options: &UnpackOptions,
) -> UnpackOutcome {
    let path = path.as_ref();
    let mut layers = 0usize;

    loop {
        if options.get_max_layers().is_some_and(|max| layers >= max) {
            debug!(path = %path.display(), layers, "layer limit reached");
            return UnpackOutcome::new(layers > 0, sniff(path));
        }

        let step = unpack_once(path, members, options);
        if !step.succeeded {
            return UnpackOutcome::new(layers > 0, step.kind);
        }

        layers += 1;
        debug!(path = %path.display(), layer = layers, kind = ?step.kind, "peeled archive layer");
    }
}

#[cfg(feature = "zip")]
fn unzip_layer(path: &Path, members: &[&str], options: &UnpackOptions) -> bool {
    crate::unzip::unpack_zip_with(path, members, options)
}

#[cfg(not(feature = "zip"))]
fn unzip_layer(path: &Path, _members: &[&str], _options: &UnpackOptions) -> bool {
    debug!(path = %path.display(), "zip support is disabled");
    false
}

#[cfg(feature = "gzip")]
fn gunzip_layer(path: &Path, options: &UnpackOptions) -> bool {
    crate::gunzip::unpack_gzip_with(path, options)
}

#[cfg(not(feature = "gzip"))]
fn gunzip_layer(path: &Path, _options: &UnpackOptions) -> bool {
    debug!(path = %path.display(), "gzip support is disabled");
    false
}

#[cfg(all(test, feature = "zip", feature = "gzip"))]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use peel_fs::ReplaceOptions;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zip_one(name: &str, data: &[u8]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn text_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipfilter.dat");
        std::fs::write(&path, "1.0.0.0 - 1.0.0.255 , 0 , a\n").unwrap();

        let outcome = unpack_archive(&path, &["ipfilter.dat"]);

        assert_eq!(outcome, UnpackOutcome::new(false, FileKind::Text));
        assert_eq!(std::fs::read(&path).unwrap(), b"1.0.0.0 - 1.0.0.255 , 0 , a\n");
    }

    #[test]
    fn legacy_metadata_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.met");
        std::fs::write(&path, [0x0Eu8, 0x02, 0x00, 0x00, 0x00]).unwrap();

        let outcome = unpack_archive(&path, &[]);

        assert_eq!(outcome, UnpackOutcome::new(false, FileKind::LegacyMetadata));
        assert_eq!(std::fs::read(&path).unwrap(), [0x0Eu8, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn single_gzip_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipfilter.dat");
        std::fs::write(&path, gzip(b"plain filter text")).unwrap();

        let step = unpack_once(&path, &[], &UnpackOptions::new());

        assert_eq!(step, UnpackOutcome::new(true, FileKind::GZip));
        assert_eq!(std::fs::read(&path).unwrap(), b"plain filter text");
    }

    #[test]
    fn gzip_then_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipfilter.dat");
        std::fs::write(&path, gzip(b"plain filter text")).unwrap();

        let outcome = unpack_archive(&path, &[]);

        assert_eq!(outcome, UnpackOutcome::new(true, FileKind::Text));
    }

    #[test]
    fn zip_miss_reports_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download.zip");
        let archive = zip_one("readme.txt", b"hello");
        std::fs::write(&path, &archive).unwrap();

        let outcome = unpack_archive(&path, &["ipfilter.dat"]);

        assert_eq!(outcome, UnpackOutcome::new(false, FileKind::Zip));
        assert_eq!(std::fs::read(&path).unwrap(), archive);
    }

    #[test]
    fn inner_failure_keeps_outer_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download.gz");
        let inner = zip_one("readme.txt", b"hello");
        std::fs::write(&path, gzip(&inner)).unwrap();

        let outcome = unpack_archive(&path, &["ipfilter.dat"]);

        assert_eq!(outcome, UnpackOutcome::new(true, FileKind::Zip));
        assert_eq!(std::fs::read(&path).unwrap(), inner);
    }

    #[test]
    fn corrupt_gzip_reports_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gz");
        std::fs::write(&path, [0x1Fu8, 0x8B, 0x08]).unwrap();

        let outcome = unpack_archive(&path, &[]);

        assert_eq!(outcome, UnpackOutcome::new(false, FileKind::GZip));
    }

    #[test]
    fn failed_replace_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipfilter.dat");
        let data = gzip(b"plain filter text");
        std::fs::write(&path, &data).unwrap();

        // The scratch file cannot be created under a missing subdirectory.
        let replace = ReplaceOptions::new().suffix("/missing");
        let options = UnpackOptions::new().replace(replace);
        let outcome = unpack_archive_with(&path, &[], &options);

        assert_eq!(outcome, UnpackOutcome::new(false, FileKind::GZip));
        assert_eq!(std::fs::read(&path).unwrap(), data);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn layer_limit_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested.gz");
        let inner = zip_one("guarding.p2p", b"guarding list");
        std::fs::write(&path, gzip(&inner)).unwrap();

        let options = UnpackOptions::new().max_layers(Some(1));
        let outcome = unpack_archive_with(&path, &["guarding.p2p"], &options);

        assert_eq!(outcome, UnpackOutcome::new(true, FileKind::Zip));
        assert_eq!(std::fs::read(&path).unwrap(), inner);
    }

    #[test]
    fn zero_layer_limit_only_classifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("once.gz");
        let data = gzip(b"text");
        std::fs::write(&path, &data).unwrap();

        let options = UnpackOptions::new().max_layers(Some(0));
        let outcome = unpack_archive_with(&path, &[], &options);

        assert_eq!(outcome, UnpackOutcome::new(false, FileKind::GZip));
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }
}
