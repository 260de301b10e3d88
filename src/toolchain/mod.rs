//! Emscripten toolchain discovery
//!
//! The toolchain is an external collaborator: wasmake only needs the path
//! to the `emcc` driver, which serves as both compiler and linker. The path
//! is derived from the SDK root named by the `EMSDK` environment variable,
//! or supplied explicitly with `--emcc`.

pub mod invoke;

use crate::error::ToolchainError;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the Emscripten SDK root
pub const EMSDK_ENV: &str = "EMSDK";

/// Path from the SDK root to the compiler driver directory
const EMCC_SUBDIR: &str = "upstream/emscripten";

/// A located Emscripten toolchain
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Path to the emcc driver, used for both compile and link invocations
    pub emcc: PathBuf,
}

impl Toolchain {
    /// Discover the toolchain from the `EMSDK` environment variable.
    ///
    /// Fatal before any work starts if the variable is unset or the driver
    /// is not where the SDK root says it should be.
    pub fn discover() -> Result<Self, ToolchainError> {
        let root = env::var_os(EMSDK_ENV).ok_or(ToolchainError::EnvNotSet { var: EMSDK_ENV })?;
        let emcc = Path::new(&root).join(EMCC_SUBDIR).join(emcc_name());
        Self::with_compiler(emcc)
    }

    /// Use an explicit compiler path, bypassing EMSDK discovery
    pub fn with_compiler(emcc: PathBuf) -> Result<Self, ToolchainError> {
        if !emcc.is_file() {
            return Err(ToolchainError::CompilerNotFound { path: emcc });
        }
        Ok(Self { emcc })
    }
}

/// emcc ships as a batch file on Windows and a shell shim elsewhere
fn emcc_name() -> &'static str {
    if cfg!(windows) {
        "emcc.bat"
    } else {
        "emcc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_with_compiler_missing() {
        let result = Toolchain::with_compiler(PathBuf::from("/nonexistent/emcc"));
        assert!(matches!(
            result,
            Err(ToolchainError::CompilerNotFound { .. })
        ));
    }

    #[test]
    fn test_with_compiler_present() {
        let dir = tempdir().unwrap();
        let emcc = dir.path().join("emcc");
        File::create(&emcc).unwrap();

        let toolchain = Toolchain::with_compiler(emcc.clone()).unwrap();
        assert_eq!(toolchain.emcc, emcc);
    }

    #[test]
    fn test_directory_is_not_a_compiler() {
        let dir = tempdir().unwrap();
        let result = Toolchain::with_compiler(dir.path().to_path_buf());
        assert!(matches!(
            result,
            Err(ToolchainError::CompilerNotFound { .. })
        ));
    }
}
