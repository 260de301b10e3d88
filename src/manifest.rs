//! Project manifest reading
//!
//! The project definition is a JSON file listing the translation units and
//! headers of the project together with its compile and link settings:
//!
//! ```json
//! {
//!   "name": "neuralnetwork",
//!   "sources": ["src/main.cpp", "src/GUI.cpp"],
//!   "headers": ["src/GUI.h"],
//!   "std": "c++20",
//!   "include_dirs": ["externals/imgui-docking", "externals/stb"],
//!   "force_include": "src/Globals.h",
//!   "preload_dir": "emscripten_data",
//!   "data_command": ["./build_data.sh"]
//! }
//! ```
//!
//! Declaration order of `sources` is preserved everywhere downstream: it is
//! the canonical ordering for the link argument list, so two runs over the
//! same manifest always link in the same order.
//!
//! Every listed file is stat'ed once at scan time. Paths are resolved
//! relative to the manifest's own directory, so a build can be driven from
//! anywhere.

use crate::error::ManifestError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

fn default_std() -> String {
    "c++20".to_string()
}

fn default_link_args() -> Vec<String> {
    [
        "-sUSE_WEBGL2=1",
        "-sUSE_GLFW=3",
        "-sWASM=1",
        "-sALLOW_MEMORY_GROWTH",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// The raw project definition as written in the manifest file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Project name; the output bundle is `<out_dir>/<name>.html`
    pub name: String,

    /// Translation units, in declaration order
    pub sources: Vec<PathBuf>,

    /// Header files. Tracked so the manifest mirrors the full project, but
    /// never consulted for staleness: a change that only touches a header
    /// does not mark its includers stale.
    #[serde(default)]
    pub headers: Vec<PathBuf>,

    /// Language standard passed as `-std=<value>`
    #[serde(default = "default_std")]
    pub std: String,

    /// Include search directories passed as `-I<dir>`
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Header force-included into every translation unit
    #[serde(default)]
    pub force_include: Option<PathBuf>,

    /// Link-time flags for the web runtime target
    #[serde(default = "default_link_args")]
    pub link_args: Vec<String>,

    /// Directory bundled into the output via `--preload-file`
    #[serde(default)]
    pub preload_dir: Option<PathBuf>,

    /// External data-preparation command, run before any compile work when
    /// the `--data` flag is given
    #[serde(default)]
    pub data_command: Option<Vec<String>>,
}

/// A file listed in the manifest, stamped with its mtime at scan time
#[derive(Debug, Clone)]
pub struct TrackedFile {
    /// Path resolved against the manifest's directory
    pub path: PathBuf,

    /// Last-modified time read from the filesystem when the manifest was
    /// scanned
    pub mtime: SystemTime,
}

/// A scanned project: the manifest plus mtime-stamped file lists
#[derive(Debug, Clone)]
pub struct Project {
    /// The parsed manifest
    pub manifest: ProjectManifest,

    /// Directory containing the manifest; all manifest-relative paths
    /// resolve against it
    pub root: PathBuf,

    /// Translation units in declaration order
    pub sources: Vec<TrackedFile>,

    /// Header files in declaration order
    pub headers: Vec<TrackedFile>,
}

impl Project {
    /// Read and scan a project manifest.
    ///
    /// Fatal if the manifest is missing or malformed, or if any listed file
    /// cannot be stat'ed - a partial manifest is not usable.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|e| ManifestError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let manifest: ProjectManifest =
            serde_json::from_str(&text).map_err(|e| ManifestError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if manifest.sources.is_empty() {
            return Err(ManifestError::NoSources);
        }

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let sources = scan_files(&root, &manifest.sources)?;
        let headers = scan_files(&root, &manifest.headers)?;

        Ok(Self {
            manifest,
            root,
            sources,
            headers,
        })
    }
}

/// Stat every listed file, preserving declaration order
fn scan_files(root: &Path, files: &[PathBuf]) -> Result<Vec<TrackedFile>, ManifestError> {
    files
        .iter()
        .map(|rel| {
            let path = root.join(rel);
            let mtime = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(|e| ManifestError::StatFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            Ok(TrackedFile { path, mtime })
        })
        .collect()
}
