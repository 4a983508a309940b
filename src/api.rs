use crate::{
    answers::{Answers, IN_TRAINING, PROJECT_NAME},
    banner, catalog,
    command::{
        check_installed, CommandRunner, CommandSpec, ExecutionError, PreflightError, SystemRunner,
    },
    config::{Config, ConfigError},
    errors::{FileOperation, IoError},
    prompt::{InteractivePrompter, PromptError, Prompter},
    source::{Source, SourceError},
    template::{self, RenderError},
};
use std::{
    fmt,
    path::{Path, PathBuf},
};

const KICKOFF_BRANCH: &str = "kickoff";
const KICKOFF_COMMIT_MESSAGE: &str = "Kickoff project";

/// The provisioning stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Prompt,
    Clone,
    Materialize,
    Install,
    Lint,
    GitBootstrap,
    Done,
}
impl Stage {
    fn as_str(&self) -> &str {
        match self {
            Self::Init => "init",
            Self::Prompt => "prompt",
            Self::Clone => "clone",
            Self::Materialize => "materialize",
            Self::Install => "install",
            Self::Lint => "lint",
            Self::GitBootstrap => "git bootstrap",
            Self::Done => "done",
        }
    }
}
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What went wrong inside a stage.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StageFailure {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Preflight(#[from] PreflightError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum KickoffError {
    #[error("kickoff aborted during the {stage} stage")]
    #[diagnostic(code(kickoff::stage))]
    Stage {
        stage: Stage,
        #[source]
        #[diagnostic_source]
        source: StageFailure,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),
}
impl KickoffError {
    /// The stage a run aborted in, if it got as far as running stages.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attaches the failing stage to a stage result.
fn at<T, E: Into<StageFailure>>(stage: Stage, result: Result<T, E>) -> Result<T, KickoffError> {
    result.map_err(|error| KickoffError::Stage {
        stage,
        source: error.into(),
    })
}

/// State threaded through the stages after prompting.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub answers: Answers,
    pub use_git: bool,
    pub destination_root: PathBuf,
    pub project_dir: PathBuf,
    pub verbose: bool,
}

/// The result of a completed run.
#[derive(Debug)]
pub struct Outcome {
    pub project_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub stages: Vec<Stage>,
}

/// Drives one provisioning run: preflight, prompt, clone, render, install, lint, commit.
pub struct Provisioner<R: CommandRunner, P: Prompter> {
    runner: R,
    prompter: P,
    config: Config,
    destination_root: PathBuf,
    verbose: bool,
}
impl<R: CommandRunner, P: Prompter> Provisioner<R, P> {
    pub fn new(
        runner: R,
        prompter: P,
        config: Config,
        destination_root: impl Into<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            runner,
            prompter,
            config,
            destination_root: destination_root.into(),
            verbose,
        }
    }

    /// Runs every stage in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns a [`KickoffError::Stage`] naming the stage that failed. Nothing already
    /// written or executed is undone.
    pub fn run(&self) -> Result<Outcome, KickoffError> {
        let mut stages = Vec::new();

        let source = at(Stage::Init, self.init())?;
        stages.push(Stage::Init);

        let ctx = at(Stage::Prompt, self.prompt())?;
        stages.push(Stage::Prompt);

        if ctx.use_git {
            at(Stage::Clone, self.clone_repository(&ctx))?;
            stages.push(Stage::Clone);
        }

        let files = at(Stage::Materialize, self.materialize(&ctx, &source))?;
        stages.push(Stage::Materialize);

        at(Stage::Install, self.install(&ctx))?;
        stages.push(Stage::Install);

        at(Stage::Lint, self.lint(&ctx))?;
        stages.push(Stage::Lint);

        if ctx.use_git {
            at(Stage::GitBootstrap, self.bootstrap_git(&ctx))?;
            stages.push(Stage::GitBootstrap);
        }

        stages.push(Stage::Done);
        log::info!("kickoff finished in {}", ctx.project_dir.display());

        Ok(Outcome {
            project_dir: ctx.project_dir,
            files,
            stages,
        })
    }

    fn init(&self) -> Result<Source, StageFailure> {
        banner::print();

        let tutorials = &self.config.tutorials;
        check_installed(&self.runner, "git", "git", &tutorials.git, self.verbose)?;
        check_installed(&self.runner, "npm", "npm", &tutorials.npm, self.verbose)?;

        let source = Source::build_from(&self.config.templates)?;
        log::debug!("using templates from {}", source.templates_dir().display());

        Ok(source)
    }

    fn prompt(&self) -> Result<RunContext, StageFailure> {
        let mut answers = self.prompter.answers()?;
        let use_git = answers.use_git();

        if answers.flag(IN_TRAINING) {
            log::debug!("applying training preset");
            answers = answers.with_preset(&self.config.preset);
        }

        let project_name = answers
            .project_name()
            .ok_or_else(|| PromptError::MissingAnswer {
                question: PROJECT_NAME.to_string(),
            })?
            .to_string();

        Ok(RunContext {
            project_dir: self.destination_root.join(&project_name),
            destination_root: self.destination_root.clone(),
            answers,
            use_git,
            verbose: self.verbose,
        })
    }

    fn command(
        &self,
        ctx: &RunContext,
        description: &str,
        program: &str,
        args: &[&str],
    ) -> CommandSpec {
        CommandSpec::new(description, program)
            .args(args.iter().copied())
            .verbose(ctx.verbose)
            .cwd(&ctx.project_dir)
    }

    fn clone_repository(&self, ctx: &RunContext) -> Result<(), StageFailure> {
        let url = ctx.answers.repository_url().unwrap_or_default();
        let project_name = project_dir_name(&ctx.project_dir);

        let spec = CommandSpec::new(format!("Cloning repository from {url}"), "git")
            .args(["clone", url, project_name.as_str()])
            .verbose(ctx.verbose)
            .cwd(&ctx.destination_root);

        self.runner.run(&spec)?;

        Ok(())
    }

    fn materialize(
        &self,
        ctx: &RunContext,
        source: &Source,
    ) -> Result<Vec<PathBuf>, StageFailure> {
        let files = template::materialize(
            catalog::FILES,
            &ctx.answers,
            &source.manifest,
            source.templates_dir(),
            &ctx.project_dir,
        )?;

        Ok(files)
    }

    fn install(&self, ctx: &RunContext) -> Result<(), StageFailure> {
        let spec = self.command(ctx, "Installing dependencies", "npm", &["install"]);

        self.runner.run(&spec)?;

        Ok(())
    }

    fn lint(&self, ctx: &RunContext) -> Result<(), StageFailure> {
        let spec = self.command(ctx, "Running linter", "npm", &["run", "lint-fix"]);

        self.runner.run(&spec)?;

        Ok(())
    }

    fn bootstrap_git(&self, ctx: &RunContext) -> Result<(), StageFailure> {
        let steps = [
            self.command(
                ctx,
                &format!("Creating branch {KICKOFF_BRANCH}"),
                "git",
                &["checkout", "-b", KICKOFF_BRANCH],
            ),
            self.command(ctx, "Add changes to git", "git", &["add", "."]),
            self.command(
                ctx,
                "Commit changes to git",
                "git",
                &["commit", "-m", KICKOFF_COMMIT_MESSAGE],
            ),
        ];

        for spec in &steps {
            self.runner.run(spec)?;
        }

        Ok(())
    }
}

fn project_dir_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Runs a full interactive kickoff in the current directory.
///
/// # Errors
///
/// Returns a [`KickoffError`] if:
///
/// - The configuration file exists but can't be read or parsed.
/// - `git` or `npm` isn't installed.
/// - The template source can't be resolved.
/// - The user cancels a prompt.
/// - Cloning, rendering, installing, linting, or committing fails.
pub fn kickoff(verbose: bool) -> Result<Outcome, KickoffError> {
    let config = Config::load()?;

    let destination_root = std::env::current_dir()
        .map_err(|error| IoError::new(FileOperation::Read, PathBuf::from("."), error))?;

    log::debug!(
        "kicking off in {} with templates from {}",
        destination_root.display(),
        config.templates
    );

    Provisioner::new(
        SystemRunner,
        InteractivePrompter,
        config,
        destination_root,
        verbose,
    )
    .run()
}
