//! Working copy of the generated project's files

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Path of the file that generation output is written to.
pub const DEFAULT_PRIMARY_PATH: &str = "src/App.jsx";

const DEFAULT_APP: &str = "// Start building...\n\nexport default function App() {\n  return (\n    <div>\n      <h1>Hello World</h1>\n    </div>\n  );\n}";
const DEFAULT_CSS: &str = "@tailwind base;\n@tailwind components;\n@tailwind utilities;";
const DEFAULT_PACKAGE: &str = "{\n  \"name\": \"my-app\",\n  \"version\": \"1.0.0\"\n}";

/// Ordered mapping of virtual file path to file content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMap(BTreeMap<String, String>);

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starter project shown before anything has been generated
    pub fn default_template() -> Self {
        [
            (DEFAULT_PRIMARY_PATH, DEFAULT_APP),
            ("src/index.css", DEFAULT_CSS),
            ("package.json", DEFAULT_PACKAGE),
        ]
        .into_iter()
        .collect()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.0.insert(path.into(), content.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this map with `path` set to `content`
    pub fn with_file(&self, path: &str, content: &str) -> Self {
        let mut next = self.clone();
        next.insert(path, content);
        next
    }

    /// Render every file into one text document, each under a path banner.
    ///
    /// Content lines that look like a banner (optionally behind backslashes)
    /// get one more leading `\` so [`from_bundle`](Self::from_bundle) can tell
    /// them apart.
    pub fn to_bundle(&self) -> String {
        self.0
            .iter()
            .map(|(path, content)| {
                let body = content
                    .split('\n')
                    .map(|line| {
                        if banner_like(line) {
                            format!("\\{line}")
                        } else {
                            line.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("// === {path} ===\n\n{body}")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Read back a document written by [`to_bundle`](Self::to_bundle).
    /// Text before the first banner is ignored.
    pub fn from_bundle(bundle: &str) -> Self {
        let mut files = Self::new();
        let mut section: Option<(String, Vec<&str>)> = None;

        for line in bundle.split('\n') {
            if let Some(path) = banner_path(line) {
                if let Some((path, lines)) = section.take() {
                    files.insert(path, join_section(&lines, false));
                }
                section = Some((path.to_string(), Vec::new()));
            } else if let Some((_, lines)) = section.as_mut() {
                match line.strip_prefix('\\') {
                    Some(escaped) if banner_like(escaped) => lines.push(escaped),
                    _ => lines.push(line),
                }
            }
        }
        if let Some((path, lines)) = section {
            files.insert(path, join_section(&lines, true));
        }
        files
    }
}

fn banner_path(line: &str) -> Option<&str> {
    line.strip_prefix("// === ")?
        .strip_suffix(" ===")
        .filter(|path| !path.is_empty())
}

/// A banner, or a banner escaped with any number of backslashes
fn banner_like(line: &str) -> bool {
    banner_path(line.trim_start_matches('\\')).is_some()
}

/// Drop the blank line after the banner and, except for the last file, the
/// blank line before the next banner
fn join_section(lines: &[&str], last: bool) -> String {
    let mut body = lines;
    if let [first, rest @ ..] = body {
        if first.is_empty() {
            body = rest;
        }
    }
    if !last {
        if let [rest @ .., tail] = body {
            if tail.is_empty() {
                body = rest;
            }
        }
    }
    body.join("\n")
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for FileMap {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        )
    }
}

/// Authoritative working copy.
///
/// The map is held as an `Arc` and swapped as a whole, so a snapshot taken by a
/// reader is always exactly one `replace_all` input (or one edit result).
#[derive(Debug, Default)]
pub struct FileStore {
    current: RwLock<Arc<FileMap>>,
}

impl FileStore {
    pub fn new(initial: FileMap) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Immutable view of the current map
    pub fn snapshot(&self) -> Arc<FileMap> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, path: &str) -> Result<String> {
        self.snapshot()
            .get(path)
            .map(str::to_string)
            .ok_or_else(|| Error::FileNotFound(path.to_string()))
    }

    /// Swap the entire map in one step
    pub fn replace_all(&self, files: FileMap) {
        let next = Arc::new(files);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Edit a single file in the working copy
    pub fn set_file(&self, path: &str, content: &str) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = guard.with_file(path, content);
        *guard = Arc::new(next);
    }
}
