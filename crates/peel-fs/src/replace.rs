use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::{Error, Result};

#[cfg(unix)]
const DEFAULT_PERMISSIONS: u32 = 0o644;

#[derive(Clone, Copy, Debug)]
pub struct ReplaceOptions {
    prefix:               &'static str,
    suffix:               &'static str,
    sync:                 bool,
    preserve_permissions: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self { Self::new() }
}

impl ReplaceOptions {
    pub fn new() -> Self {
        Self {
            prefix:               ".",
            suffix:               ".peel",
            sync:                 true,
            preserve_permissions: true,
        }
    }

    pub fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Flush the scratch file to disk before it is renamed over the target,
    /// and the directory entry after. On by default.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Carry the replaced file's permissions over to its new contents.
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    pub fn prefix_str(&self) -> &'static str { self.prefix }

    pub fn suffix_str(&self) -> &'static str { self.suffix }

    pub fn is_sync(&self) -> bool { self.sync }
}

/// A temporary file living next to the file it will replace.
///
/// Bytes written here are invisible to readers of the target until
/// [`ScratchFile::commit`] renames the scratch file over it. Dropping an
/// uncommitted scratch file deletes it and leaves the target untouched.
pub struct ScratchFile {
    file:    NamedTempFile,
    target:  PathBuf,
    options: ReplaceOptions,
}

impl ScratchFile {
    pub fn beside(target: impl AsRef<Path>, options: ReplaceOptions) -> Result<Self> {
        let target = target.as_ref();
        let parent = match target.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => return Err(Error::NoParent(target.to_path_buf())),
        };

        // Same directory as the target so the final rename never crosses devices.
        let file = tempfile::Builder::new()
            .prefix(options.prefix_str())
            .suffix(options.suffix_str())
            .tempfile_in(parent)
            .map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            file,
            target: target.to_path_buf(),
            options,
        })
    }

    pub fn path(&self) -> &Path { self.file.path() }

    pub fn target(&self) -> &Path { &self.target }

    pub fn commit(self) -> Result<()> {
        let Self {
            mut file,
            target,
            options,
        } = self;

        let write_err = |source: io::Error| Error::Write {
            path: target.clone(),
            source,
        };

        file.flush().map_err(write_err)?;
        if options.sync {
            file.as_file().sync_all().map_err(write_err)?;
        }

        if options.preserve_permissions {
            match fs::metadata(&target) {
                Ok(meta) => {
                    fs::set_permissions(file.path(), meta.permissions()).map_err(write_err)?
                }
                Err(_) => apply_default_permissions(file.path()).map_err(write_err)?,
            }
        }

        file.persist(&target).map_err(|e| Error::Persist {
            path: target.clone(),
            source: e.error,
        })?;

        // The contents are already in place, so a failed directory sync only
        // weakens durability of the rename.
        if options.sync {
            if let Err(e) = sync_parent(&target) {
                warn!(path = %target.display(), error = %e, "failed to sync directory after replace");
            }
        }

        Ok(())
    }
}

impl Write for ScratchFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.file.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.file.flush() }
}

#[cfg(unix)]
fn apply_default_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(DEFAULT_PERMISSIONS))
}

#[cfg(not(unix))]
fn apply_default_permissions(_path: &Path) -> io::Result<()> { Ok(()) }

/// Persist the rename itself by syncing the directory that holds `target`.
#[cfg(unix)]
fn sync_parent(target: &Path) -> io::Result<()> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent(_target: &Path) -> io::Result<()> { Ok(()) }

/// Atomically replace `target` with `content`.
pub fn replace_file(
    target: impl AsRef<Path>,
    content: &[u8],
    options: ReplaceOptions,
) -> Result<()> {
    let mut scratch = ScratchFile::beside(target, options)?;
    scratch.write_all(content).map_err(|e| Error::Write {
        path: scratch.path().to_path_buf(),
        source: e,
    })?;
    scratch.commit()
}
