use std::io::{self, Read, Write};

use tracing::trace;

/// Which side of a chunked copy failed.
#[derive(Debug)]
pub(crate) enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy `reader` to `writer` in chunks of `buffer_size` bytes.
pub(crate) fn copy_chunks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> Result<u64, CopyError> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buffer[..read]).map_err(CopyError::Write)?;
        total += read as u64;
        trace!(chunk = read, total, "copied chunk");
    }
}
