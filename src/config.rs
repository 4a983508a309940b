use crate::{
    answers::Answers,
    catalog,
    errors::{FileOperation, IoError, ParseError},
};
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const CONFIG_ENV: &str = "KICKOFF_CONFIG";
pub const CONFIG_FILE: &str = "kickoff.toml";

const GIT_TUTORIAL: &str = "https://git-scm.com/book/en/v2/Getting-Started-Installing-Git";
const NPM_TUTORIAL: &str = "https://docs.npmjs.com/downloading-and-installing-node-js-and-npm";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("I/O error within config domain")]
    #[diagnostic(code(kickoff::config::io))]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Tutorials {
    #[serde(default = "default_git_tutorial")]
    pub git: String,
    #[serde(default = "default_npm_tutorial")]
    pub npm: String,
}
impl Default for Tutorials {
    fn default() -> Self {
        Self {
            git: default_git_tutorial(),
            npm: default_npm_tutorial(),
        }
    }
}
fn default_git_tutorial() -> String {
    GIT_TUTORIAL.to_string()
}
fn default_npm_tutorial() -> String {
    NPM_TUTORIAL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Local directory or git reference holding the templates.
    #[serde(default = "default_templates")]
    pub templates: String,
    #[serde(default)]
    pub tutorials: Tutorials,
    /// Answers forced on training projects.
    #[serde(default = "catalog::training_preset")]
    pub preset: Answers,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            tutorials: Tutorials::default(),
            preset: catalog::training_preset(),
        }
    }
}
/// Templates directory of the source checkout the binary was built from.
const BUILD_TEMPLATES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

fn default_templates() -> String {
    let executable = std::env::current_exe().ok();

    templates_near(executable.as_deref())
}

/// Looks for templates installed next to `executable` (`<bin>/templates`, then
/// `<bin>/../share/kickoff/templates`), falling back to the build checkout.
fn templates_near(executable: Option<&Path>) -> String {
    let bin_dir = executable.and_then(Path::parent);

    let mut installed = bin_dir.into_iter().flat_map(|dir| {
        [
            dir.join("templates"),
            dir.join("..").join("share").join("kickoff").join("templates"),
        ]
    });

    installed
        .find(|candidate| candidate.is_dir())
        .map(|found| found.display().to_string())
        .unwrap_or_else(|| BUILD_TEMPLATES.to_string())
}
impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        let parsed = toml::from_str(&content)
            .map_err(|error| ParseError::toml(path.to_path_buf(), error))?;

        Ok(parsed)
    }

    /// Loads `$KICKOFF_CONFIG`, else `./kickoff.toml`, else the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        Self::load_from(explicit, Path::new(CONFIG_FILE))
    }

    fn load_from(explicit: Option<PathBuf>, fallback: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::debug!("loading config from {}", path.display());
            return Self::from_file(path);
        }

        if fallback.is_file() {
            log::debug!("loading config from {}", fallback.display());
            return Self::from_file(fallback);
        }

        log::debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.templates, default_templates());
        assert_eq!(config.tutorials, Tutorials::default());
        assert_eq!(config.preset, catalog::training_preset());
    }

    #[test]
    fn overrides_are_read() {
        let config: Config = toml::from_str(
            r#"
            templates = "gh:acme/node-templates"

            [tutorials]
            npm = "https://example.com/npm"

            [preset]
            docker = true
            "#,
        )
        .unwrap();

        assert_eq!(config.templates, "gh:acme/node-templates");
        assert_eq!(config.tutorials.npm, "https://example.com/npm");
        assert_eq!(config.tutorials.git, GIT_TUTORIAL);
        assert!(config.preset.flag("docker"));
        assert_eq!(config.preset.len(), 1);
    }

    #[test]
    fn prefers_templates_next_to_the_executable() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(bin.join("templates")).unwrap();

        let found = templates_near(Some(&bin.join("kickoff")));

        assert_eq!(found, bin.join("templates").display().to_string());
    }

    #[test]
    fn finds_templates_under_share() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        let shared = dir.path().join("share").join("kickoff").join("templates");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&shared).unwrap();

        let found = PathBuf::from(templates_near(Some(&bin.join("kickoff"))));

        assert_eq!(found.canonicalize().unwrap(), shared.canonicalize().unwrap());
    }

    #[test]
    fn falls_back_to_build_templates() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(templates_near(Some(&dir.path().join("kickoff"))), BUILD_TEMPLATES);
        assert_eq!(templates_near(None), BUILD_TEMPLATES);
    }

    #[test]
    fn falls_back_to_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load_from(None, &dir.path().join(CONFIG_FILE)).unwrap();

        assert_eq!(config.templates, default_templates());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();

        let error = Config::load_from(Some(dir.path().join("missing.toml")), Path::new(CONFIG_FILE))
            .unwrap_err();

        assert!(matches!(error, ConfigError::Io(_)));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "templates = [").unwrap();

        let error = Config::load_from(None, &path).unwrap_err();

        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
