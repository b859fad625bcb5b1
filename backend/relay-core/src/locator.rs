//! Maps a file path to the project-descriptor file that owns it.

use std::fs::read_dir;
use std::path::{Path, PathBuf, absolute};

use log::{debug, trace};

/// Lookup from a file to a candidate project descriptor. Pure, no side effects.
pub trait ProjectLocator: Send + Sync {
    fn find_project_for(&self, file_path: &Path) -> Option<PathBuf>;
}

/// Walks from the file's directory towards the filesystem root and returns the
/// first descriptor found (sorted by file name when a directory has several).
#[derive(Debug, Clone)]
pub struct AncestorLocator {
    extensions: Vec<String>,
}

impl AncestorLocator {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub(crate) fn is_descriptor(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    fn descriptor_in(&self, dir: &Path) -> Option<PathBuf> {
        let entries = match read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                trace!("Cannot read {}: {e}", dir.display());
                return None;
            }
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.is_descriptor(path))
            .collect();

        candidates.sort();
        candidates.into_iter().next()
    }
}

impl ProjectLocator for AncestorLocator {
    fn find_project_for(&self, file_path: &Path) -> Option<PathBuf> {
        let file_path = absolute(file_path).unwrap_or_else(|_| file_path.to_path_buf());
        let start = if file_path.is_dir() {
            file_path.as_path()
        } else {
            file_path.parent()?
        };

        let found = start.ancestors().find_map(|dir| self.descriptor_in(dir));

        match &found {
            Some(project) => debug!(
                "Located project {} for {}",
                project.display(),
                file_path.display()
            ),
            None => debug!("No project found for {}", file_path.display()),
        }

        found
    }
}
