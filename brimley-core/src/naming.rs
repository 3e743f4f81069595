//! Function-name grammar, reserved-name set, canonical id construction, and
//! the case/separator folding used for near-collision warnings.

use std::path::Path;

/// Names that collide with REPL/admin surface commands and so cannot be used
/// for a discovered function.
pub const RESERVED_FUNCTION_NAMES: &[&str] = &[
    "help", "quit", "exit", "reset", "reload", "settings", "config", "state", "functions",
    "entities", "databases", "errors",
];

pub fn is_reserved_function_name(name: &str) -> bool {
    RESERVED_FUNCTION_NAMES.contains(&name.to_lowercase().as_str())
}

/// `^[A-Za-z][A-Za-z0-9_-]{0,63}$`, checked without a regex crate dependency
/// since the grammar is simple enough to walk by hand.
pub fn is_valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    if rest.len() > 63 {
        return false;
    }
    rest.iter().all(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
}

/// Case/separator-folded form used to detect near-collisions between two
/// distinct, individually-valid names (`WARN_NAME_PROXIMITY`).
pub fn normalize_name_for_proximity(name: &str) -> String {
    name.to_lowercase().replace(['-', '_'], "")
}

/// Build the deterministic `{kind}:{path-relative-to-root-posix}:{symbol}`
/// canonical id. Stable across renames of enclosing
/// directories, not of the symbol itself.
pub fn build_canonical_id(kind: &str, root_dir: &Path, source_file: &Path, symbol: &str) -> String {
    format!("{kind}:{}:{symbol}", canonical_file_key(root_dir, source_file))
}

/// The `{path-relative-to-root-posix}` segment alone, lowercased the same way
/// [`build_canonical_id`] does — used by the reload engine to match a
/// diagnostic's source file against the canonical ids it already issued for
/// that file, without re-deriving the symbol or kind.
pub fn canonical_file_key(root_dir: &Path, source_file: &Path) -> String {
    relative_posix_path(root_dir, source_file).to_lowercase()
}

fn relative_posix_path(root_dir: &Path, source_file: &Path) -> String {
    let root_resolved = root_dir.canonicalize().unwrap_or_else(|_| root_dir.to_path_buf());
    let source_resolved = source_file.canonicalize().unwrap_or_else(|_| source_file.to_path_buf());

    let relative = source_resolved
        .strip_prefix(&root_resolved)
        .map(Path::to_path_buf)
        .unwrap_or(source_resolved);

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
