//! Task registry - user-declared run tasks keyed by name
//!
//! Tasks are declared in YAML documents mapping a task name to its file
//! extensions, a syntax-highlighter hint and a command template:
//!
//! ```yaml
//! tasks:
//!   python:
//!     extensions: [py]
//!     highlighter: python
//!     command: "python3 {path}{file}{ext}"
//! ```
//!
//! Two documents are read per project: a global one under the user's home
//! and a project-local one. Project entries shadow global entries sharing
//! the same name (override, not field merge). A reload rebuilds the whole
//! registry; nothing is ever patched in place.

use runcode_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Project-local task document, relative to the project directory
pub const PROJECT_CONFIG_FILE: &str = ".tasks.yaml";

/// Global task document path (`~/.runcode/tasks.yaml`)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".runcode").join("tasks.yaml"))
}

fn default_highlighter() -> String {
    "txt".to_string()
}

/// One user-declared run task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDefinition {
    /// Task name; the key in the document, filled in after parse
    #[serde(skip)]
    pub name: String,

    /// File extensions this task applies to, without the leading dot
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Syntax-highlighter hint for the UI
    #[serde(default = "default_highlighter")]
    pub highlighter: String,

    /// Command template; see `expand` for the placeholder syntax
    #[serde(default)]
    pub command: String,
}

impl TaskDefinition {
    /// A file matches iff its name ends with `.` + one of the extensions.
    /// The comparison is case-sensitive and uses the literal suffix.
    pub fn matches(&self, file_name: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| file_name.ends_with(&format!(".{}", ext)))
    }
}

/// On-disk document shape
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskDocument {
    #[serde(default)]
    tasks: BTreeMap<String, TaskDefinition>,
}

/// Immutable mapping from task name to definition
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl TaskRegistry {
    /// Parse one YAML task document. A decode failure surfaces as
    /// `ConfigParse` and nothing is applied.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: TaskDocument =
            serde_yaml::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))?;
        let mut tasks = doc.tasks;
        for (name, task) in tasks.iter_mut() {
            task.name = name.clone();
        }
        Ok(Self { tasks })
    }

    /// Load one task document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading task document");
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// One-level shadowing merge: copy every global task name absent from
    /// this (project) set. Project entries are never overwritten.
    pub fn merge_global(mut self, global: &TaskRegistry) -> Self {
        for (name, task) in &global.tasks {
            if !self.tasks.contains_key(name) {
                self.tasks.insert(name.clone(), task.clone());
            }
        }
        self
    }

    /// Load and merge the global and project documents. Either may be
    /// absent; a malformed document fails the whole load so the caller can
    /// keep its previous registry.
    pub fn load_for_project(project_dir: &Path) -> Result<Self> {
        let global = match global_config_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };

        let project_path = project_dir.join(PROJECT_CONFIG_FILE);
        let project = if project_path.exists() {
            Self::load(&project_path)?
        } else {
            Self::default()
        };

        let merged = project.merge_global(&global);
        info!(tasks = merged.len(), "Loaded task registry");
        Ok(merged)
    }

    /// Every task whose extension set contains the file's suffix. May be
    /// empty or ambiguous; disambiguation is the caller's responsibility.
    pub fn resolve(&self, file_name: &str) -> Vec<&TaskDefinition> {
        self.tasks
            .values()
            .filter(|task| task.matches(file_name))
            .collect()
    }

    /// Convenience for callers that cannot disambiguate.
    pub fn resolve_unique(&self, file_name: &str) -> Result<&TaskDefinition> {
        let mut matches = self.resolve(file_name);
        match matches.len() {
            0 => Err(Error::NoTaskForFile(file_name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousTask(file_name.to_string())),
        }
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    /// Iterate all tasks in name order
    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
tasks:
  python:
    extensions: [py]
    highlighter: python
    command: "python3 {path}{file}{ext}"
  node:
    extensions: [js, mjs]
    highlighter: javascript
    command: "node {path}{file}{ext}"
"#;

    #[test]
    fn test_parse_document() {
        let registry = TaskRegistry::parse(DOC).unwrap();
        assert_eq!(registry.len(), 2);

        let python = registry.get("python").unwrap();
        assert_eq!(python.name, "python");
        assert_eq!(python.extensions, vec!["py"]);
        assert_eq!(python.highlighter, "python");
    }

    #[test]
    fn test_parse_defaults() {
        let registry = TaskRegistry::parse("tasks:\n  raw:\n    extensions: [txt]\n").unwrap();
        let raw = registry.get("raw").unwrap();
        assert_eq!(raw.highlighter, "txt");
        assert_eq!(raw.command, "");
    }

    #[test]
    fn test_parse_malformed() {
        let err = TaskRegistry::parse("tasks:\n  broken:\n    extensions: 12\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));

        let err = TaskRegistry::parse("tasks:\n  broken:\n    unknown_field: x\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_resolve_suffix_semantics() {
        let registry = TaskRegistry::parse(DOC).unwrap();

        assert_eq!(registry.resolve("main.py").len(), 1);
        assert_eq!(registry.resolve("test.tar.py").len(), 1);
        assert!(registry.resolve("pyproject.toml").is_empty());
        // case-sensitive
        assert!(registry.resolve("MAIN.PY").is_empty());
    }

    #[test]
    fn test_resolve_ambiguous() {
        let doc = r#"
tasks:
  pytest:
    extensions: [py]
    command: "pytest {path}{file}{ext}"
  python:
    extensions: [py]
    command: "python3 {path}{file}{ext}"
"#;
        let registry = TaskRegistry::parse(doc).unwrap();
        assert_eq!(registry.resolve("main.py").len(), 2);
        assert!(matches!(
            registry.resolve_unique("main.py"),
            Err(Error::AmbiguousTask(_))
        ));
        assert!(matches!(
            registry.resolve_unique("readme.md"),
            Err(Error::NoTaskForFile(_))
        ));
    }

    #[test]
    fn test_merge_shadowing() {
        let project = TaskRegistry::parse(
            "tasks:\n  a:\n    extensions: [py]\n    command: project-a\n",
        )
        .unwrap();
        let global = TaskRegistry::parse(
            "tasks:\n  a:\n    extensions: [py]\n    command: global-a\n  b:\n    extensions: [sh]\n    command: global-b\n",
        )
        .unwrap();

        let merged = project.merge_global(&global);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("a").unwrap().command, "project-a");
        assert_eq!(merged.get("b").unwrap().command, "global-b");
    }

    #[test]
    fn test_load_for_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "tasks:\n  shell:\n    extensions: [sh]\n    command: \"sh {path}{file}{ext}\"\n",
        )
        .unwrap();

        let registry = TaskRegistry::load_for_project(dir.path()).unwrap();
        assert!(registry.get("shell").is_some());
        assert_eq!(registry.resolve("run.sh").len(), 1);
    }

    #[test]
    fn test_load_missing_project_document() {
        let dir = tempfile::tempdir().unwrap();
        // No .tasks.yaml anywhere: an empty registry, not an error.
        let registry = TaskRegistry::load_for_project(dir.path());
        assert!(registry.is_ok());
    }
}
