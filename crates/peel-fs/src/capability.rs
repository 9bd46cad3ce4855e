//! Filesystem naming-capability probes.
//!
//! Some filesystems (FAT32, NTFS through most drivers) reject characters such
//! as `:` in file names. Callers that are about to write files with arbitrary
//! names ask a [`CapabilityCache`] whether the target directory lives on such a
//! filesystem. The answer for each directory is computed once by a
//! [`CapabilityProvider`] and remembered for the lifetime of the cache.
//!
//! # Platform Behavior
//!
//! **Windows**: [`NativeProvider`] answers [`FsCapability::RestrictedNaming`]
//! without touching the disk.
//!
//! **Everything else**: [`NativeProvider`] delegates to [`ProbeProvider`],
//! which tries to create a file named `:` inside the directory.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

/// Rejected by FAT32 and NTFS, accepted by most unix filesystems.
const PROBE_NAME: &str = ":";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FsCapability {
    /// The filesystem rejects FAT32-invalid names.
    RestrictedNaming,
    NotRestricted,
    /// The probe could not tell either way, e.g. the directory is not writable.
    ProbeFailed,
}

impl FsCapability {
    pub fn is_restricted(self) -> bool { matches!(self, Self::RestrictedNaming) }
}

pub trait CapabilityProvider {
    fn check(&self, dir: &Path) -> FsCapability;
}

/// Determines the capability by creating (and removing) a probe file.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbeProvider;

impl CapabilityProvider for ProbeProvider {
    fn check(&self, dir: &Path) -> FsCapability {
        let probe = dir.join(PROBE_NAME);

        match OpenOptions::new().write(true).create_new(true).open(&probe) {
            Ok(file) => {
                drop(file);
                if let Err(e) = fs::remove_file(&probe) {
                    warn!(path = %probe.display(), error = %e, "failed to remove capability probe");
                }
                FsCapability::NotRestricted
            }
            Err(e) => {
                let capability = classify_probe_error(&e);
                debug!(path = %probe.display(), error = %e, ?capability, "capability probe refused");
                capability
            }
        }
    }
}

#[cfg(unix)]
fn classify_probe_error(err: &io::Error) -> FsCapability {
    use nix::errno::Errno;

    match err.raw_os_error().map(Errno::from_raw) {
        Some(Errno::EINVAL) => FsCapability::RestrictedNaming,
        // Something already occupies the name, so the filesystem allows it.
        Some(Errno::EEXIST) => FsCapability::NotRestricted,
        _ => FsCapability::ProbeFailed,
    }
}

#[cfg(not(unix))]
fn classify_probe_error(err: &io::Error) -> FsCapability {
    match err.kind() {
        io::ErrorKind::InvalidInput => FsCapability::RestrictedNaming,
        io::ErrorKind::AlreadyExists => FsCapability::NotRestricted,
        _ => FsCapability::ProbeFailed,
    }
}

/// Answers the same capability for every directory.
#[derive(Clone, Copy, Debug)]
pub struct FixedProvider(pub FsCapability);

impl CapabilityProvider for FixedProvider {
    fn check(&self, _dir: &Path) -> FsCapability { self.0 }
}

/// The provider for the platform this crate was built for.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeProvider;

impl CapabilityProvider for NativeProvider {
    #[cfg(windows)]
    fn check(&self, _dir: &Path) -> FsCapability { FsCapability::RestrictedNaming }

    #[cfg(not(windows))]
    fn check(&self, dir: &Path) -> FsCapability { ProbeProvider.check(dir) }
}

/// Per-directory memo of [`FsCapability`] results.
///
/// One lock covers lookups, probes and inserts, so every directory is probed
/// at most once even when several threads ask at the same time. Probes of
/// unrelated directories are serialized as a consequence.
///
/// [`FsCapability::ProbeFailed`] is remembered like any other answer and is
/// never retried.
pub struct CapabilityCache<P = NativeProvider> {
    provider: P,
    entries:  Mutex<HashMap<PathBuf, FsCapability>>,
}

impl CapabilityCache<NativeProvider> {
    pub fn new() -> Self { Self::with_provider(NativeProvider) }
}

impl Default for CapabilityCache<NativeProvider> {
    fn default() -> Self { Self::new() }
}

impl<P: CapabilityProvider> CapabilityCache<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Capability of the filesystem holding `dir`.
    ///
    /// `dir` must name a directory; an empty path is a caller bug.
    pub fn check(&self, dir: impl AsRef<Path>) -> FsCapability {
        let dir = dir.as_ref();
        debug_assert!(
            !dir.as_os_str().is_empty(),
            "CapabilityCache::check called with an empty path"
        );
        if dir.as_os_str().is_empty() {
            warn!("capability check requested for an empty path");
            return FsCapability::ProbeFailed;
        }

        let key = cache_key(dir);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&capability) = entries.get(&key) {
            return capability;
        }

        let capability = self.provider.check(&key);
        debug!(path = %key.display(), ?capability, "filesystem capability probed");
        entries.insert(key, capability);
        capability
    }

    /// The remembered answer for `dir`, without probing.
    pub fn cached(&self, dir: impl AsRef<Path>) -> Option<FsCapability> {
        let key = cache_key(dir.as_ref());
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn provider(&self) -> &P { &self.provider }
}

/// Canonical form of `dir`, with case folded where the platform's default
/// filesystems ignore it. A case-sensitive volume mounted on such a platform
/// shares one entry between directories differing only in case.
fn cache_key(dir: &Path) -> PathBuf {
    let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    fold_case(canonical)
}

#[cfg(any(windows, target_os = "macos"))]
fn fold_case(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(s.to_lowercase()),
        None => path,
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
fn fold_case(path: PathBuf) -> PathBuf { path }
