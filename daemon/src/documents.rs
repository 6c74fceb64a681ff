//! Filesystem document store: references are paths relative to one root.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use matric_admission::{DocumentError, DocumentStore};

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `reference` under the root, refusing anything that could
    /// step outside it.
    fn resolve(&self, reference: &str) -> Result<PathBuf, DocumentError> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if reference.is_empty() || escapes {
            return Err(DocumentError::Backend(format!(
                "reference {reference:?} is not a relative path under the document root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentStore for FsDocumentStore {
    fn delete(&self, reference: &str) -> Result<(), DocumentError> {
        let path = self.resolve(reference)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DocumentError::NotFound(reference.to_string()))
            }
            Err(e) => Err(DocumentError::Backend(format!("{}: {e}", path.display()))),
        }
    }
}
