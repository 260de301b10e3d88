//! Staleness evaluation for object artifacts
//!
//! For each translation unit this module derives the object artifact path
//! and decides whether it must be recompiled. The decision is a pure
//! timestamp comparison: the artifact is stale when it does not exist, when
//! it is older than its source, or when a full rebuild was requested.
//!
//! Header dependencies are not tracked: a change that only touches a header
//! does not mark its includers stale. Only the source file's own timestamp
//! is compared.

use crate::manifest::TrackedFile;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension given to object artifacts
pub const OBJECT_EXT: &str = "o";

/// An object artifact derived from one source file
#[derive(Debug, Clone)]
pub struct ObjectArtifact {
    /// Derived artifact path under the object directory
    pub path: PathBuf,

    /// Artifact mtime, None when the artifact does not exist yet
    pub mtime: Option<SystemTime>,

    /// Whether the source must be recompiled this run
    pub needs_rebuild: bool,
}

/// Derive the artifact path for a source file.
///
/// Only the base filename survives: `src/GUI.cpp` maps to `<obj_dir>/GUI.o`.
/// Two sources with the same filename in different directories therefore
/// collide on the same artifact; the evaluator does not guard against that.
pub fn artifact_path(source: &Path, obj_dir: &Path) -> PathBuf {
    let mut name = PathBuf::from(source.file_name().unwrap_or(source.as_os_str()));
    name.set_extension(OBJECT_EXT);
    obj_dir.join(name)
}

/// The staleness decision itself.
///
/// An absent artifact is always stale. Equal timestamps count as fresh:
/// only an artifact strictly older than its source needs a rebuild.
pub fn is_stale(source_mtime: SystemTime, artifact_mtime: Option<SystemTime>, force: bool) -> bool {
    if force {
        return true;
    }
    match artifact_mtime {
        None => true,
        Some(mtime) => mtime < source_mtime,
    }
}

/// Evaluate one source file against the filesystem
pub fn evaluate(source: &TrackedFile, obj_dir: &Path, force: bool) -> ObjectArtifact {
    let path = artifact_path(&source.path, obj_dir);
    let mtime = fs::metadata(&path).and_then(|m| m.modified()).ok();
    let needs_rebuild = is_stale(source.mtime, mtime, force);

    ObjectArtifact {
        path,
        mtime,
        needs_rebuild,
    }
}
