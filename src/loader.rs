// SyntaxLang source loading
// The front end dumps each parsed `x.sl` as a JSON statement tree next to
// it (`x.sl.json`); loaders turn paths into `Program`s for the interpreter.

use crate::ast::Program;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid statement tree: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}: no such file")]
    NotFound(PathBuf),
}

/// Resolves and loads source units for the interpreter and its imports
pub trait SourceLoader {
    /// Absolute identity of a source path; fails when it does not exist
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, LoadError>;

    fn is_directory(&self, path: &Path) -> bool;

    fn load(&self, path: &Path) -> Result<Program, LoadError>;
}

/// Path of the statement tree dumped for `path`
pub fn tree_path(path: &Path) -> PathBuf {
    if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        return path.to_path_buf();
    }
    let mut tree = path.as_os_str().to_owned();
    tree.push(".json");
    PathBuf::from(tree)
}

/// Resolve `.` and `..` without touching the file system
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Reads `<file>.json` trees from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeLoader;

impl SourceLoader for JsonTreeLoader {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if let Ok(canonical) = fs::canonicalize(path) {
            return Ok(canonical);
        }
        let tree = tree_path(path);
        let canonical = fs::canonicalize(&tree).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // report the source path, not the dump next to it
        Ok(canonical.with_extension(""))
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn load(&self, path: &Path) -> Result<Program, LoadError> {
        let tree = tree_path(path);
        let text = fs::read_to_string(&tree).map_err(|source| LoadError::Io {
            path: tree.clone(),
            source,
        })?;
        let mut program: Program =
            serde_json::from_str(&text).map_err(|source| LoadError::Json {
                path: tree.clone(),
                source,
            })?;
        if program.source.is_none() && tree != path {
            program.source = fs::read_to_string(path).ok();
        }
        tracing::debug!(path = %tree.display(), statements = program.statements.len(), "loaded statement tree");
        Ok(program)
    }
}

/// Serves trees registered in memory; used by embedders and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    programs: FxHashMap<PathBuf, Program>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, program: Program) {
        self.programs.insert(normalize(path.as_ref()), program);
    }
}

impl SourceLoader for MemoryLoader {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, LoadError> {
        let normalized = normalize(path);
        if self.programs.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(LoadError::NotFound(normalized))
        }
    }

    fn is_directory(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        !self.programs.contains_key(&normalized)
            && self
                .programs
                .keys()
                .any(|key| key != &normalized && key.starts_with(&normalized))
    }

    fn load(&self, path: &Path) -> Result<Program, LoadError> {
        self.programs
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}
