use crate::errors::{FileOperation, IoError, ParseError};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

/// Location of the manifest inside a template source.
pub const MANIFEST_PATH: &str = "dependencies/package.json";

#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("I/O error within manifest domain")]
    #[diagnostic(code(kickoff::manifest::io))]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

/// Pinned dependency versions that end up interpolated into the generated `package.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyManifest {
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
}
impl DependencyManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        let parsed = serde_json::from_str(&content)
            .map_err(|error| ParseError::json(path.to_path_buf(), error))?;

        Ok(parsed)
    }

    /// Flattens both dependency tables into `<camelCaseName>Version -> version` pairs.
    /// A dev dependency overrides a runtime dependency with the same key.
    pub fn versions(&self) -> IndexMap<String, String> {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .map(|(name, version)| (format!("{}Version", camel_case(name)), version.clone()))
            .collect()
    }
}

/// Converts a package name into a camelCase identifier, the way npm's `camel-case` does.
///
/// Words are split on runs of anything that isn't an ASCII letter or digit, on
/// lower-or-digit to upper transitions, and inside upper-case runs before a capital
/// followed by a lower-case letter. A word after the first that starts with a digit is
/// prefixed with `_`, so `base-64` becomes `base_64`.
pub fn camel_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (index, &ch) in chars.iter().enumerate() {
        if !ch.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let previous = index.checked_sub(1).map(|i| chars[i]);
        let next = chars.get(index + 1).copied();
        let boundary = match previous {
            Some(p) if (p.is_ascii_lowercase() || p.is_ascii_digit()) && ch.is_ascii_uppercase() => {
                true
            }
            Some(p) if p.is_ascii_uppercase() && ch.is_ascii_uppercase() => {
                next.is_some_and(|n| n.is_ascii_lowercase())
            }
            _ => false,
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut out = String::with_capacity(input.len() + 1);
    for (index, word) in words.iter().enumerate() {
        let lower = word.to_ascii_lowercase();
        if index == 0 {
            out.push_str(&lower);
            continue;
        }
        if lower.starts_with(|c: char| c.is_ascii_digit()) {
            out.push('_');
            out.push_str(&lower);
            continue;
        }
        let mut letters = lower.chars();
        if let Some(first) = letters.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(letters.as_str());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_cases_package_names() {
        assert_eq!(camel_case("jest"), "jest");
        assert_eq!(camel_case("eslint-plugin-import"), "eslintPluginImport");
        assert_eq!(camel_case("@babel/core"), "babelCore");
        assert_eq!(camel_case("body_parser"), "bodyParser");
        assert_eq!(camel_case("lint-staged"), "lintStaged");
        assert_eq!(camel_case("typeORM"), "typeOrm");
    }

    #[test]
    fn splits_acronym_runs() {
        assert_eq!(camel_case("XMLHttpRequest"), "xmlHttpRequest");
        assert_eq!(camel_case("parseURLPath"), "parseUrlPath");
    }

    #[test]
    fn digit_words_get_underscore() {
        assert_eq!(camel_case("base-64"), "base_64");
        assert_eq!(camel_case("v8-compile-cache"), "v8CompileCache");
        assert_eq!(camel_case("md5"), "md5");
    }

    #[test]
    fn flattens_both_tables() {
        let manifest: DependencyManifest = serde_json::from_str(
            r#"{
                "dependencies": { "express": "^4.18.2", "body-parser": "^1.20.2" },
                "devDependencies": { "jest": "^29.7.0" }
            }"#,
        )
        .unwrap();

        let versions = manifest.versions();

        assert_eq!(versions.get("expressVersion").map(String::as_str), Some("^4.18.2"));
        assert_eq!(versions.get("bodyParserVersion").map(String::as_str), Some("^1.20.2"));
        assert_eq!(versions.get("jestVersion").map(String::as_str), Some("^29.7.0"));
        assert_eq!(versions.len(), 3);
    }

    #[test]
    fn dev_dependency_wins_on_collision() {
        let manifest: DependencyManifest = serde_json::from_str(
            r#"{ "dependencies": { "a-b": "1" }, "devDependencies": { "a_b": "2" } }"#,
        )
        .unwrap();

        assert_eq!(manifest.versions().get("aBVersion").map(String::as_str), Some("2"));
    }

    #[test]
    fn missing_tables_default_to_empty() {
        let manifest: DependencyManifest = serde_json::from_str("{}").unwrap();

        assert!(manifest.versions().is_empty());
    }

    #[test]
    fn reports_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{ not json").unwrap();

        let error = DependencyManifest::from_file(&path).unwrap_err();

        assert!(matches!(error, ManifestError::Parse(_)));
    }

    #[test]
    fn reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let error = DependencyManifest::from_file(dir.path().join("nope.json")).unwrap_err();

        assert!(matches!(error, ManifestError::Io(_)));
    }
}
