//! Filesystem primitives for in-place file rewriting.
//!
//! - `replace` - atomic replacement of a file's contents through a scratch file
//! - `capability` - FAT32-style naming restriction probes and their cache
//! - `dir` - immediate-children listing with wildcard masks

mod error;

pub mod capability;
pub mod dir;
pub mod replace;

pub use capability::{
    CapabilityCache, CapabilityProvider, FixedProvider, FsCapability, NativeProvider, ProbeProvider,
};
pub use dir::{DirFilter, DirIter};
pub use error::{Error, Result};
pub use replace::{ReplaceOptions, ScratchFile, replace_file};
