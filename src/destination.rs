//! Destination resolution.
//!
//! Turns the small keyword vocabulary accepted on the command line (`SAME`,
//! `REL`, `SAME-AS-1`, `SAME-AS-2`, or a free-form path) into a
//! [`PathStrategy`], and a strategy plus the two source paths into one concrete
//! destination path.
//!
//! Resolution is purely lexical: nothing here touches the filesystem, so the
//! same three inputs always produce the same destination.
//!
//! Terminology:
//! - *volume root*: the path prefix (drive letter / UNC share on Windows) plus
//!   the root separator. On Unix this is just `/`.
//! - *relative portion*: everything below the volume root.
//! - *target volume*: the volume of the *other* file, where this file's content
//!   is headed.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Which of the two inputs a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    First,
    Second,
}

impl FileSlot {
    pub fn other(self) -> Self {
        match self {
            FileSlot::First => FileSlot::Second,
            FileSlot::Second => FileSlot::First,
        }
    }
}

impl fmt::Display for FileSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSlot::First => f.write_str("1"),
            FileSlot::Second => f.write_str("2"),
        }
    }
}

/// How one file's destination is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStrategy {
    /// `SAME`: no relocation.
    Keep,
    /// `REL`: keep the path below the volume root, on the other file's volume.
    PreserveRelative,
    /// `SAME-AS-n`: adopt the directory of file `n`, keep this file's name.
    /// Never refers to the file it is attached to.
    MirrorOther(FileSlot),
    /// Anything else: a user supplied path. An absolute one whose last
    /// component has an extension (or is a dot-name) names the file itself;
    /// otherwise it is a directory that receives the file under its own name.
    Explicit(String),
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStrategy::Keep => f.write_str("SAME"),
            PathStrategy::PreserveRelative => f.write_str("REL"),
            PathStrategy::MirrorOther(slot) => write!(f, "SAME-AS-{slot}"),
            PathStrategy::Explicit(p) => f.write_str(p),
        }
    }
}

/// Parse a destination keyword or path for the file in `slot`.
///
/// Keywords are matched case-insensitively. A `SAME-AS-n` naming the file it is
/// attached to is meaningless and becomes `REL`.
pub fn parse_destination(raw: &str, slot: FileSlot) -> PathStrategy {
    let strategy = match raw.to_ascii_uppercase().as_str() {
        "SAME" => PathStrategy::Keep,
        "REL" => PathStrategy::PreserveRelative,
        "SAME-AS-1" => PathStrategy::MirrorOther(FileSlot::First),
        "SAME-AS-2" => PathStrategy::MirrorOther(FileSlot::Second),
        _ => PathStrategy::Explicit(raw.to_string()),
    };

    match strategy {
        PathStrategy::MirrorOther(target) if target == slot => PathStrategy::PreserveRelative,
        other => other,
    }
}

/// One strategy per input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    pub first: PathStrategy,
    pub second: PathStrategy,
}

impl Default for DestinationSpec {
    fn default() -> Self {
        Self {
            first: PathStrategy::Keep,
            second: PathStrategy::Keep,
        }
    }
}

impl DestinationSpec {
    /// Build the spec from the raw per-file flags.
    ///
    /// With no flag at all both files keep their paths (a pure content swap).
    /// Once either flag is given, a missing or empty flag means `REL`.
    pub fn from_flags(first: Option<&str>, second: Option<&str>) -> Self {
        let first = first.map(str::trim).filter(|s| !s.is_empty());
        let second = second.map(str::trim).filter(|s| !s.is_empty());

        if first.is_none() && second.is_none() {
            return Self::default();
        }

        let pick = |raw: Option<&str>, slot| match raw {
            Some(s) => parse_destination(s, slot),
            None => PathStrategy::PreserveRelative,
        };

        Self {
            first: pick(first, FileSlot::First),
            second: pick(second, FileSlot::Second),
        }
    }

    pub fn for_slot(&self, slot: FileSlot) -> &PathStrategy {
        match slot {
            FileSlot::First => &self.first,
            FileSlot::Second => &self.second,
        }
    }

    /// True when neither file asks to be relocated.
    pub fn is_in_place(&self) -> bool {
        self.first == PathStrategy::Keep && self.second == PathStrategy::Keep
    }
}

/// Everything below the volume identifier and root separator.
pub fn relative_portion(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

/// The volume identifier plus root separator (complement of [`relative_portion`]).
pub fn volume_root(path: &Path) -> PathBuf {
    path.components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

fn has_volume_prefix(path: &Path) -> bool {
    matches!(path.components().next(), Some(Component::Prefix(_)))
}

fn starts_with_separator(raw: &str) -> bool {
    raw.starts_with('/') || raw.starts_with(std::path::MAIN_SEPARATOR)
}

fn is_bare_separator(raw: &str) -> bool {
    raw == "/" || raw == std::path::MAIN_SEPARATOR_STR
}

/// Lexical guess whether an absolute explicit path names a directory: its last
/// component has no extension and is not a dot-name like `.profile`.
fn names_directory(path: &Path) -> bool {
    match path.file_name() {
        None => true,
        Some(name) => {
            let dot_name = name.to_string_lossy().starts_with('.');
            path.extension().is_none() && !dot_name
        }
    }
}

/// Resolve where the file at `source` should end up, given the other input at
/// `other` and the strategy chosen for `source`.
///
/// Both paths are expected to be absolute.
pub fn resolve(source: &Path, other: &Path, strategy: &PathStrategy) -> PathBuf {
    let target_root = volume_root(other);
    let own_name = source.file_name().unwrap_or_else(|| OsStr::new(""));

    match strategy {
        PathStrategy::Keep => source.to_path_buf(),
        PathStrategy::PreserveRelative => target_root.join(relative_portion(source)),
        PathStrategy::MirrorOther(_) => {
            let other_dir = other.parent().map(relative_portion).unwrap_or_default();
            target_root.join(other_dir).join(own_name)
        }
        PathStrategy::Explicit(raw) => resolve_explicit(raw, &target_root, own_name),
    }
}

fn resolve_explicit(raw: &str, target_root: &Path, own_name: &OsStr) -> PathBuf {
    if is_bare_separator(raw) {
        return target_root.join(own_name);
    }

    let given = Path::new(raw);
    if has_volume_prefix(given) && given.has_root() {
        if names_directory(given) {
            return given.join(own_name);
        }
        return given.to_path_buf();
    }

    // Volume-relative: same directory-or-file reading, on the target volume.
    if starts_with_separator(raw) {
        let on_target = target_root.join(relative_portion(given));
        if names_directory(given) {
            return on_target.join(own_name);
        }
        return on_target;
    }

    // Plain relative paths always name a directory below the target root.
    target_root.join(given).join(own_name)
}
