use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use flate2::bufread::GzDecoder;
use peel_fs::ScratchFile;
use tracing::{debug, warn};

use crate::copy::{CopyError, copy_chunks};
use crate::error::{Error, Result};
use crate::options::UnpackOptions;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Replace the gzip file at `path` with its decompressed contents.
///
/// Concatenated gzip members are decoded back to back. Once a member has been
/// decoded to its end, whatever follows that does not start with a gzip header
/// (zero padding, trailing junk) is ignored. A decode error inside any member
/// discards everything written so far and leaves the file untouched. Returns
/// the number of decompressed bytes committed.
pub fn decompress_gzip(path: impl AsRef<Path>, options: &UnpackOptions) -> Result<u64> {
    let path = path.as_ref();
    let io_err = |source: io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
    let mut scratch = ScratchFile::beside(path, options.replace_options())?;
    let mut bytes = 0u64;
    let mut members = 0usize;

    loop {
        if members > 0 {
            let mut head = Vec::with_capacity(GZIP_MAGIC.len());
            (&mut reader)
                .take(GZIP_MAGIC.len() as u64)
                .read_to_end(&mut head)
                .map_err(io_err)?;
            if head.is_empty() {
                break;
            }
            if head != GZIP_MAGIC {
                debug!(path = %path.display(), members, "ignoring trailing bytes after gzip stream");
                break;
            }
            reader = Box::new(Cursor::new(head).chain(reader));
        }

        let mut decoder = GzDecoder::new(reader);
        bytes += copy_chunks(&mut decoder, &mut scratch, options.get_buffer_size()).map_err(
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
        reader = decoder.into_inner();
        members += 1;
    }

    scratch.commit()?;
    debug!(path = %path.display(), members, bytes, "replaced gzip file with its contents");
    Ok(bytes)
}

/// [`decompress_gzip`] with default options, reporting only success.
pub fn unpack_gzip(path: impl AsRef<Path>) -> bool {
    unpack_gzip_with(path, &UnpackOptions::default())
}

pub fn unpack_gzip_with(path: impl AsRef<Path>, options: &UnpackOptions) -> bool {
    let path = path.as_ref();
    match decompress_gzip(path, options) {
        Ok(_) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to unpack gzip file");
            false
        }
    }
}
