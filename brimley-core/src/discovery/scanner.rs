//! Directory scanner: walks a root directory, identifies candidate
//! function files with a cheap 500-byte peek, delegates to the matching
//! parser, stamps canonical ids, and validates names.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::diagnostic::{codes, Diagnostic, Severity};
use crate::model::{EntityRecord, FunctionRecord};
use crate::naming::{build_canonical_id, is_reserved_function_name, is_valid_function_name, normalize_name_for_proximity};

use super::{entity_parser, native_parser, sql_parser, template_parser};

const CANDIDATE_EXTENSIONS: &[&str] = &["sql", "md", "txt", "jinja", "j2", "rs", "yaml", "yml"];
const PEEK_BYTES: usize = 500;

pub struct ScanResult {
    /// Successfully discovered, name-validated SQL and template functions.
    pub functions: Vec<FunctionRecord>,
    /// Native-function frontmatter found during the diagnostics companion
    /// pass. Never fed to the dispatcher; used only to cross-check
    /// against [`crate::native_registry`]'s explicit registrations.
    pub native_declarations: Vec<FunctionRecord>,
    /// Declarative and native entity definitions discovered in-tree. These
    /// live in a namespace separate from functions, so a
    /// function and an entity may share a name.
    pub entities: Vec<EntityRecord>,
    /// Diagnostics attributable to the functions domain (SQL, template, and
    /// native-companion files). Kept separate from [`Self::entity_diagnostics`]
    /// so the reload engine can evaluate each domain's blocking
    /// condition independently without re-deriving domain from file path.
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics attributable to the entities domain.
    pub entity_diagnostics: Vec<Diagnostic>,
}

pub fn scan(root_dir: &Path) -> ScanResult {
    let mut functions = Vec::new();
    let mut native_declarations = Vec::new();
    let mut entities = Vec::new();
    let mut diagnostics = Vec::new();
    let mut entity_diagnostics = Vec::new();
    let mut seen_names: HashMap<String, ()> = HashMap::new();
    let mut seen_entity_names: HashMap<String, ()> = HashMap::new();
    let mut proximity_index: HashMap<String, String> = HashMap::new();
    let mut warned_pairs: HashSet<(String, String)> = HashSet::new();

    for entry in WalkDir::new(root_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_path = entry.path();
        let Some(func_type) = identify_function_type(file_path) else { continue };

        let is_entity_file = func_type == "declarative_entity" || func_type == "native_entity";
        let content = match fs::read_to_string(file_path) {
            Ok(c) => c,
            Err(e) => {
                let diagnostic = Diagnostic::new(
                    file_path.display().to_string(),
                    codes::ERR_PARSE_FAILURE,
                    Severity::Error,
                    format!("could not read file: {e}"),
                )
                .with_suggestion("check that the file is valid UTF-8 and readable");
                if is_entity_file {
                    entity_diagnostics.push(diagnostic);
                } else {
                    diagnostics.push(diagnostic);
                }
                continue;
            }
        };

        if func_type == "native_function" {
            match native_parser::parse(&content) {
                Ok(Some(mut record)) => {
                    record.common.canonical_id = build_canonical_id("native", root_dir, file_path, &record.common.name);
                    native_declarations.push(record);
                }
                Ok(None) => {}
                Err(e) => diagnostics.push(
                    Diagnostic::new(file_path.display().to_string(), codes::ERR_PARSE_FAILURE, Severity::Error, e)
                        .with_suggestion("check YAML syntax and required fields"),
                ),
            }
            continue;
        }

        if is_entity_file {
            match entity_parser::parse(&content, &func_type) {
                Ok(mut record) => {
                    record.canonical_id = build_canonical_id("entity", root_dir, file_path, &record.name);

                    if let Some(diagnostic) = validate_name(file_path, &record.name) {
                        entity_diagnostics.push(diagnostic);
                        continue;
                    }
                    if crate::model::BUILTIN_ENTITY_NAMES.contains(&record.name.as_str()) {
                        entity_diagnostics.push(
                            Diagnostic::new(
                                file_path.display().to_string(),
                                codes::ERR_RESERVED_NAME,
                                Severity::Error,
                                format!("'{}' collides with a built-in entity name", record.name),
                            )
                            .with_suggestion("choose a different entity name"),
                        );
                        continue;
                    }
                    if seen_entity_names.contains_key(&record.name) {
                        entity_diagnostics.push(
                            Diagnostic::new(
                                file_path.display().to_string(),
                                codes::ERR_DUPLICATE_NAME,
                                Severity::Error,
                                format!("entity '{}' is already defined", record.name),
                            )
                            .with_suggestion("rename this entity or remove the duplicate"),
                        );
                        continue;
                    }
                    seen_entity_names.insert(record.name.clone(), ());
                    entities.push(record);
                }
                Err(e) => entity_diagnostics.push(
                    Diagnostic::new(file_path.display().to_string(), codes::ERR_PARSE_FAILURE, Severity::Error, e)
                        .with_suggestion("check YAML syntax and required fields"),
                ),
            }
            continue;
        }

        let parsed = match func_type.as_str() {
            "sql_function" => sql_parser::parse(&content).map(|r| ("sql", r)),
            "template_function" => template_parser::parse(&content).map(|r| ("template", r)),
            other => Err(format!("unknown function type: {other}")),
        };

        let (kind_tag, mut record) = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(file_path.display().to_string(), codes::ERR_PARSE_FAILURE, Severity::Error, e)
                        .with_suggestion("check YAML syntax and required fields"),
                );
                continue;
            }
        };

        record.common.canonical_id = build_canonical_id(kind_tag, root_dir, file_path, &record.common.name);

        if let Some(diagnostic) = validate_name(file_path, &record.common.name) {
            diagnostics.push(diagnostic);
            continue;
        }

        if seen_names.contains_key(&record.common.name) {
            diagnostics.push(
                Diagnostic::new(
                    file_path.display().to_string(),
                    codes::ERR_DUPLICATE_NAME,
                    Severity::Error,
                    format!("function '{}' is already defined", record.common.name),
                )
                .with_suggestion("rename this function or remove the duplicate"),
            );
            continue;
        }

        check_proximity(&record.common.name, file_path, &mut proximity_index, &mut warned_pairs, &mut diagnostics);

        seen_names.insert(record.common.name.clone(), ());
        functions.push(record);
    }

    ScanResult { functions, native_declarations, entities, diagnostics, entity_diagnostics }
}

fn validate_name(file_path: &Path, name: &str) -> Option<Diagnostic> {
    if !is_valid_function_name(name) {
        return Some(
            Diagnostic::new(
                file_path.display().to_string(),
                codes::ERR_INVALID_NAME,
                Severity::Error,
                format!("'{name}' is an invalid function name"),
            )
            .with_suggestion("names must start with a letter and contain only alphanumeric characters, underscores, or dashes"),
        );
    }
    if is_reserved_function_name(name) {
        return Some(
            Diagnostic::new(
                file_path.display().to_string(),
                codes::ERR_RESERVED_NAME,
                Severity::Error,
                format!("'{name}' collides with a reserved REPL/admin command name"),
            )
            .with_suggestion("choose a different name"),
        );
    }
    None
}

fn check_proximity(
    name: &str,
    file_path: &Path,
    proximity_index: &mut HashMap<String, String>,
    warned_pairs: &mut HashSet<(String, String)>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let folded = normalize_name_for_proximity(name);
    if let Some(existing) = proximity_index.get(&folded) {
        if existing != name {
            let pair = if existing < name {
                (existing.clone(), name.to_string())
            } else {
                (name.to_string(), existing.clone())
            };
            if warned_pairs.insert(pair) {
                diagnostics.push(
                    Diagnostic::new(
                        file_path.display().to_string(),
                        codes::WARN_NAME_PROXIMITY,
                        Severity::Warning,
                        format!("'{name}' is easily confused with existing function '{existing}'"),
                    )
                    .with_suggestion("consider a more distinct name"),
                );
            }
        }
    } else {
        proximity_index.insert(folded, name.to_string());
    }
}

/// Peek the first [`PEEK_BYTES`] of a candidate file looking for
/// `type:\s*([a-z_]+_function)`, without a regex dependency.
fn identify_function_type(file_path: &Path) -> Option<String> {
    let ext = file_path.extension()?.to_str()?.to_lowercase();
    if !CANDIDATE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    let bytes = fs::read(file_path).ok()?;
    let take = bytes.len().min(PEEK_BYTES);
    let head = String::from_utf8_lossy(&bytes[..take]);

    find_type_tag(&head)
}

fn find_type_tag(head: &str) -> Option<String> {
    let idx = head.find("type:")?;
    let rest = head[idx + "type:".len()..].trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
        .unwrap_or(rest.len());
    let candidate = &rest[..end];
    let is_function_tag = candidate.ends_with("_function") && candidate.len() > "_function".len();
    let is_entity_tag = candidate.ends_with("_entity") && candidate.len() > "_entity".len();
    if is_function_tag || is_entity_tag {
        Some(candidate.to_string())
    } else {
        None
    }
}
