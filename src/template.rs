use crate::{
    answers::Answers,
    errors::{FileOperation, IoError},
    manifest::DependencyManifest,
};
use colored::Colorize;
use miette::Diagnostic;
use rayon::prelude::*;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("I/O error within template domain")]
    #[diagnostic(code(kickoff::template::io))]
    Io(#[from] IoError),

    #[error("Error occurred attempting to render template '{template}'")]
    #[diagnostic(
        code(kickoff::template::render),
        help("Check the template syntax and that every variable it uses is answered")
    )]
    Render {
        template: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("unable to move rendered file into '{path}'")]
    #[diagnostic(code(kickoff::template::persist))]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Extension marking a template whose output is a JavaScript source file.
pub const TEMPLATE_EXTENSION: &str = "ejs";
const SCRIPT_EXTENSION: &str = "js";
const PACKAGE_JSON: &str = "package.json";

/// Predicate deciding whether a template is part of the generated project.
pub type Condition = fn(&Answers) -> bool;

/// A candidate template file. Known at compile time, never mutated.
#[derive(Clone, Copy)]
pub struct FileDescriptor {
    pub name: &'static str,
    pub directory: Option<&'static str>,
    pub new_name: Option<&'static str>,
    pub condition: Option<Condition>,
}
impl FileDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            directory: None,
            new_name: None,
            condition: None,
        }
    }

    pub const fn in_dir(mut self, directory: &'static str) -> Self {
        self.directory = Some(directory);
        self
    }

    pub const fn renamed(mut self, new_name: &'static str) -> Self {
        self.new_name = Some(new_name);
        self
    }

    pub const fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn is_included(&self, answers: &Answers) -> bool {
        self.condition.map_or(true, |condition| condition(answers))
    }

    /// `foo.ejs` always becomes `foo.js`; otherwise the rename wins over the original name.
    pub fn effective_name(&self) -> String {
        let path = Path::new(self.name);
        let is_template = path
            .extension()
            .map(|ext| ext == TEMPLATE_EXTENSION)
            .unwrap_or(false);

        if is_template {
            let stem = path.file_stem().unwrap_or_default().to_string_lossy();
            return format!("{stem}.{SCRIPT_EXTENSION}");
        }

        self.new_name.unwrap_or(self.name).to_string()
    }

    /// Path of the template, relative to the template source.
    pub fn template_path(&self) -> PathBuf {
        join_directory(self.directory, self.name)
    }

    /// Path of the rendered file, relative to the project directory.
    pub fn output_path(&self) -> PathBuf {
        join_directory(self.directory, &self.effective_name())
    }
}

impl std::fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("new_name", &self.new_name)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

fn join_directory(directory: Option<&str>, name: &str) -> PathBuf {
    match directory {
        Some(directory) => Path::new(directory).join(name),
        None => PathBuf::from(name),
    }
}

/// One file that will be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub template: PathBuf,
    pub output: PathBuf,
    pub with_versions: bool,
}

/// Selects the descriptors whose condition holds, in declaration order, and resolves their paths.
pub fn plan(descriptors: &[FileDescriptor], answers: &Answers) -> Vec<PlannedFile> {
    descriptors
        .iter()
        .filter(|descriptor| descriptor.is_included(answers))
        .map(|descriptor| {
            let effective_name = descriptor.effective_name();

            PlannedFile {
                template: descriptor.template_path(),
                output: descriptor.output_path(),
                with_versions: effective_name == PACKAGE_JSON,
            }
        })
        .collect()
}

/// Builds the substitution context for one file. Answers win over dependency versions.
fn make_context(answers: &Answers, manifest: &DependencyManifest, with_versions: bool) -> Context {
    if !with_versions {
        return answers.to_context();
    }

    let mut context = Context::new();
    for (key, version) in manifest.versions() {
        context.insert(key, &version);
    }
    context.extend(answers.to_context());

    context
}

/// A template rendered in memory, waiting to be written.
struct RenderedFile {
    destination: PathBuf,
    contents: String,
}

/// Renders every selected descriptor from `templates_dir` into `project_dir`.
///
/// Templates are rendered in parallel and nothing is written until all of them rendered.
/// Files are then written in declaration order, so on a shared output path the
/// later descriptor wins. Returned paths follow declaration order.
///
/// # Errors
///
/// Returns a [`RenderError`] if a template can't be read, rendered, or written.
pub fn materialize(
    descriptors: &[FileDescriptor],
    answers: &Answers,
    manifest: &DependencyManifest,
    templates_dir: &Path,
    project_dir: &Path,
) -> Result<Vec<PathBuf>, RenderError> {
    let planned = plan(descriptors, answers);

    log::debug!(
        "materializing {} of {} templates into {}",
        planned.len(),
        descriptors.len(),
        project_dir.display()
    );

    let rendered: Vec<RenderedFile> = planned
        .par_iter()
        .map(|file| {
            let context = make_context(answers, manifest, file.with_versions);
            render_file(
                &templates_dir.join(&file.template),
                project_dir.join(&file.output),
                &context,
            )
        })
        .collect::<Result<_, _>>()?;

    rendered
        .into_iter()
        .map(|file| {
            let parent = file
                .destination
                .parent()
                .unwrap_or_else(|| Path::new("."));
            create_directory(parent)?;
            write_file(parent, &file.destination, &file.contents)?;

            Ok(file.destination)
        })
        .collect()
}

/// Renders a single template in memory.
fn render_file(
    template: &Path,
    destination: PathBuf,
    context: &Context,
) -> Result<RenderedFile, RenderError> {
    let content = std::fs::read_to_string(template)
        .map_err(|error| IoError::new(FileOperation::Read, template.to_path_buf(), error))?;

    let contents =
        Tera::one_off(&content, context, false).map_err(|error| RenderError::Render {
            template: template.to_path_buf(),
            source: error,
        })?;

    Ok(RenderedFile {
        destination,
        contents,
    })
}

fn create_directory(path: &Path) -> Result<(), RenderError> {
    std::fs::create_dir_all(path)
        .map_err(|error| IoError::new(FileOperation::Mkdir, path.into(), error))?;

    Ok(())
}

/// Writes through a temporary sibling file, then renames it over `path`.
fn write_file(parent: &Path, path: &Path, contents: &str) -> Result<(), RenderError> {
    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .map_err(|error| IoError::new(FileOperation::Write, path.into(), error))?;

    staged
        .write_all(contents.as_bytes())
        .and_then(|()| staged.flush())
        .map_err(|error| IoError::new(FileOperation::Write, path.into(), error))?;

    staged
        .persist(path)
        .map_err(|error| RenderError::Persist {
            path: path.to_path_buf(),
            source: error,
        })?;

    println!("{} {}", "create".green(), path.display());

    Ok(())
}
