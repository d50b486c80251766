//! Command template expansion
//!
//! Templates contain `{name}` placeholders. The built-in set is derived
//! from the target file's absolute path (separators normalized to `/`):
//!
//! - `{path}` / `{path/}` - directory containing the file, with trailing
//!   slash; `.` when the path has no directory component
//! - `{path.}` - the same directory with slashes replaced by dots
//! - `{path\}` - the same directory with slashes replaced by back-slashes
//! - `{file}` - file name without its final extension
//! - `{ext}` - final extension including the leading dot, or empty
//!
//! Built-ins are substituted first by literal replacement. Every remaining
//! `{name}` is free-form: the user is prompted once per distinct name in
//! first-occurrence order, and one answer substitutes every occurrence of
//! that exact placeholder. A dismissed prompt aborts the expansion before
//! any process is spawned.
//!
//! The expanded string is later split into process arguments on whitespace.
//! There is no quoting or escaping support.

use regex::Regex;
use runcode_foundation::{Error, Result, UiDelegate};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Matches one `{name}` placeholder
fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").unwrap())
}

/// Substitute the path-derived built-in placeholders.
pub fn expand_builtins(template: &str, file_path: &Path) -> String {
    let full = file_path.to_string_lossy().replace('\\', "/");

    let (dir, name) = match full.rfind('/') {
        Some(pos) => (full[..=pos].to_string(), &full[pos + 1..]),
        None => (String::new(), full.as_str()),
    };
    let dir_slash = if dir.is_empty() { ".".to_string() } else { dir };
    let dir_dots = dir_slash.replace('/', ".");
    let dir_back = dir_slash.replace('/', "\\");

    let (stem, ext) = match name.rfind('.') {
        Some(pos) => (&name[..pos], name[pos..].to_string()),
        None => (name, String::new()),
    };

    template
        .replace("{path}", &dir_slash)
        .replace("{path/}", &dir_slash)
        .replace("{path.}", &dir_dots)
        .replace("{path\\}", &dir_back)
        .replace("{file}", stem)
        .replace("{ext}", &ext)
}

/// Expand a command template against the target file, prompting the user
/// for any remaining free-form placeholders through the delegate.
pub async fn expand_command(
    template: &str,
    file_path: &Path,
    delegate: &dyn UiDelegate,
) -> Result<String> {
    let expanded = expand_builtins(template, file_path);

    // Distinct remaining placeholders, first-occurrence order.
    let mut order: Vec<String> = Vec::new();
    for cap in placeholder_pattern().captures_iter(&expanded) {
        let name = cap[1].to_string();
        if !order.contains(&name) {
            order.push(name);
        }
    }
    if order.is_empty() {
        return Ok(expanded);
    }

    let mut answers: HashMap<String, String> = HashMap::new();
    for name in &order {
        match delegate.prompt_input(name).await {
            Some(value) => {
                answers.insert(name.clone(), value);
            }
            None => return Err(Error::Cancelled),
        }
    }

    let result = placeholder_pattern().replace_all(&expanded, |caps: &regex::Captures| {
        answers
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(result.into_owned())
}

/// Split an expanded command into process-argument tokens. Plain whitespace
/// split; quoting is intentionally unsupported.
pub fn tokenize(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
