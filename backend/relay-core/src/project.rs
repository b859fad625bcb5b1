//! Project identifiers.
//!
//! A host is matched to a request by the project-descriptor file it has loaded.
//! Two identifiers are equal iff their normalized forms are byte-equal; the
//! original path is kept so it can still be handed to the host unchanged.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf, absolute};
use std::sync::OnceLock;

use regex::Regex;

const FOREIGN_ABSOLUTE_PATTERN: &str = r"^(?:[A-Za-z]:[\\/]|\\\\|/)";
const SEPARATORS: [char; 2] = ['/', '\\'];

static FOREIGN_ABSOLUTE_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_foreign_absolute_regex() -> &'static Regex {
    FOREIGN_ABSOLUTE_REGEX
        .get_or_init(|| Regex::new(FOREIGN_ABSOLUTE_PATTERN).expect("valid regex pattern"))
}

#[derive(Debug, Clone)]
pub struct ProjectIdentifier {
    path: PathBuf,
    normalized: String,
}

impl ProjectIdentifier {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let normalized = normalize(&path.to_string_lossy());
        Self { path, normalized }
    }

    /// The path as it was given, suitable for launching the host.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl PartialEq for ProjectIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for ProjectIdentifier {}

impl Hash for ProjectIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl Display for ProjectIdentifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.path.display())
    }
}

/// Normalize a project path for comparison.
///
/// Makes the path absolute (against the current directory), folds case and
/// strips trailing separators while keeping a bare root. Idempotent.
pub fn normalize(path: &str) -> String {
    let absolute = make_absolute(path);
    let folded = absolute.to_lowercase();
    strip_trailing_separators(&folded)
}

fn make_absolute(path: &str) -> String {
    if path.is_empty() || get_foreign_absolute_regex().is_match(path) || Path::new(path).is_absolute()
    {
        return path.to_string();
    }

    absolute(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string())
}

pub(crate) fn strip_trailing_separators(path: &str) -> String {
    let trimmed = path.trim_end_matches(SEPARATORS);

    if trimmed.len() == path.len() {
        return path.to_string();
    }

    // "/" and "\\" stay a root, "c:\" stays a drive root
    let root_separator = &path[trimmed.len()..trimmed.len() + 1];
    if trimmed.is_empty() || is_drive(trimmed) {
        return format!("{trimmed}{root_separator}");
    }

    trimmed.to_string()
}

fn is_drive(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
