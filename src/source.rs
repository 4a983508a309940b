use crate::{
    errors::{FileOperation, IoError},
    manifest::{DependencyManifest, ManifestError, MANIFEST_PATH},
};
use git2::Repository;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum SourceError {
    #[error("I/O error within source domain")]
    #[diagnostic(code(kickoff::source::io))]
    Io(#[from] IoError),

    #[error("unable to clone templates from: '{url}': {source}")]
    #[diagnostic(
        code(kickoff::source::git_clone),
        help("Make sure that username and project name are correct")
    )]
    GitClone {
        url: String,
        path: PathBuf,
        source: git2::Error,
    },

    #[error("template directory not found: '{path}'")]
    #[diagnostic(
        code(kickoff::source::not_found),
        help("Point `templates` in kickoff.toml to an existing directory or git repository")
    )]
    NotFound { path: PathBuf },

    #[error("unable to read the dependency manifest")]
    #[diagnostic(code(kickoff::source::manifest))]
    Manifest(#[from] ManifestError),
}

/// A resolved template source: the directory holding the templates and its dependency manifest.
#[derive(Debug)]
pub struct Source {
    pub templates_dir: PathBuf,
    pub manifest: DependencyManifest,
    // keeps a cloned checkout alive until the run ends
    _checkout: Option<TempDir>,
}
impl Source {
    fn is_git(source: &str) -> bool {
        lazy_static::lazy_static! {
            static ref GIT_URL_REGEX: regex::Regex = regex::Regex::new(
                r"(?x)        # Enable extended mode
                ^(?:
                    # 1) gh:account/repo
                    gh:[^/]+/[^/]+
                    |
                    # 2) gl:account/repo
                    gl:[^/]+/[^/]+
                    |
                    # 3) git@host:account/repo.git
                    git@[A-Za-z0-9._-]+:[^/]+/[^/]+\.git
                    |
                    # 4) git+http(s)://...
                    git\+https?://.*
                )$"
            ).expect("a valid regex pattern");
        }

        GIT_URL_REGEX.is_match(source)
    }

    /// Turns a git reference accepted by [`Source::is_git`] into a clonable url.
    fn expand_git_url(url: &str) -> String {
        if let Some(stripped) = url.strip_prefix("gh:") {
            format!("https://github.com/{}.git", stripped)
        } else if let Some(stripped) = url.strip_prefix("gl:") {
            format!("https://gitlab.com/{}.git", stripped)
        } else if let Some(stripped) = url.strip_prefix("git+") {
            stripped.to_string()
        } else {
            url.to_string()
        }
    }

    /// Resolves `source` to a local template directory, cloning it first if it is a git reference.
    pub fn build_from(source: &str) -> Result<Self, SourceError> {
        let (templates_dir, checkout) = if Source::is_git(source) {
            let directory = tempfile::tempdir()
                .map_err(|error| IoError::new(FileOperation::Mkdir, PathBuf::new(), error))?;

            let expanded_url = Source::expand_git_url(source);

            log::debug!(
                "cloning templates from {} into {}",
                expanded_url,
                directory.path().display()
            );

            Repository::clone(&expanded_url, directory.path()).map_err(|err| {
                SourceError::GitClone {
                    url: expanded_url.clone(),
                    path: directory.path().to_path_buf(),
                    source: err,
                }
            })?;

            (directory.path().to_path_buf(), Some(directory))
        } else {
            (PathBuf::from(source), None)
        };

        Self::from_dir(templates_dir, checkout)
    }

    fn from_dir(templates_dir: PathBuf, checkout: Option<TempDir>) -> Result<Self, SourceError> {
        if !templates_dir.is_dir() {
            return Err(SourceError::NotFound {
                path: templates_dir,
            });
        }

        let manifest = DependencyManifest::from_file(templates_dir.join(MANIFEST_PATH))?;

        Ok(Source {
            templates_dir,
            manifest,
            _checkout: checkout,
        })
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }
}
