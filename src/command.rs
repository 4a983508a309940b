use colored::Colorize;
use miette::Diagnostic;
use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use thiserror::Error;

/// Lines of captured stderr kept on a failed quiet command.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error, Diagnostic)]
pub enum ExecutionError {
    #[error("{message}")]
    #[diagnostic(
        code(kickoff::command::spawn),
        help("Make sure `{program}` is installed and available on your PATH")
    )]
    Spawn {
        message: String,
        program: String,
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    #[diagnostic(code(kickoff::command::failed))]
    Failed {
        message: String,
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        #[help]
        stderr: Option<String>,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{tool} is required to run this generator")]
#[diagnostic(code(kickoff::command::preflight))]
pub struct PreflightError {
    pub tool: String,
    #[help]
    pub hint: String,
    #[source]
    #[diagnostic_source]
    pub source: ExecutionError,
}

/// Everything needed to run one external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub description: String,
    pub program: String,
    pub args: Vec<String>,
    pub verbose: bool,
    pub fail_message: Option<String>,
    pub cwd: Option<PathBuf>,
}
impl CommandSpec {
    pub fn new(description: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            program: program.into(),
            args: Vec::new(),
            verbose: false,
            fail_message: None,
            cwd: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn fail_message(mut self, message: impl Into<String>) -> Self {
        self.fail_message = Some(message.into());
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// The message a failure of this command reports.
    pub fn failure_message(&self) -> String {
        self.fail_message
            .clone()
            .unwrap_or_else(|| format!("{} failed", self.program))
    }
}
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external programs. Implemented by [`SystemRunner`] and by test doubles.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), ExecutionError>;
}
impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> Result<(), ExecutionError> {
        (**self).run(spec)
    }
}

/// Spawns real processes with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), ExecutionError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());

        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        log::debug!("running `{}` (cwd: {:?})", spec, spec.cwd);

        if spec.verbose {
            println!("{} {}", "run".cyan().bold(), spec.description.bold());

            let status = command
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|error| spawn_error(spec, error))?;

            if status.success() {
                return Ok(());
            }

            return Err(failed_error(spec, status.code(), None));
        }

        let output = command.output().map_err(|error| spawn_error(spec, error))?;

        if output.status.success() {
            log::debug!("`{}` succeeded", spec);
            return Ok(());
        }

        let stderr = stderr_tail(&String::from_utf8_lossy(&output.stderr));

        Err(failed_error(spec, output.status.code(), stderr))
    }
}

fn spawn_error(spec: &CommandSpec, error: std::io::Error) -> ExecutionError {
    log::debug!("unable to spawn `{}`: {}", spec, error);

    ExecutionError::Spawn {
        message: spec.failure_message(),
        program: spec.program.clone(),
        args: spec.args.clone(),
        source: error,
    }
}

fn failed_error(spec: &CommandSpec, code: Option<i32>, stderr: Option<String>) -> ExecutionError {
    log::debug!("`{}` exited with {:?}", spec, code);

    ExecutionError::Failed {
        message: spec.failure_message(),
        program: spec.program.clone(),
        args: spec.args.clone(),
        code,
        stderr,
    }
}

fn stderr_tail(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);

    Some(lines[start..].join("\n"))
}

/// Runs `<program> --version` to confirm a required tool is installed.
///
/// # Errors
///
/// Returns a [`PreflightError`] pointing at `link` when the tool can't be run.
pub fn check_installed<R: CommandRunner + ?Sized>(
    runner: &R,
    name: &str,
    program: &str,
    link: &str,
    verbose: bool,
) -> Result<(), PreflightError> {
    let hint = format!("{name} is required to run this generator, check {link}");

    let spec = CommandSpec::new(format!("Checking if {name} is installed"), program)
        .args(["--version"])
        .verbose(verbose)
        .fail_message(hint.clone());

    runner.run(&spec).map_err(|source| PreflightError {
        tool: name.to_string(),
        hint,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let spec = CommandSpec::new("Installing dependencies", "npm")
            .args(["install"])
            .cwd("demo")
            .verbose(true);

        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["install".to_string()]);
        assert_eq!(spec.cwd, Some(PathBuf::from("demo")));
        assert!(spec.verbose);
        assert_eq!(spec.to_string(), "npm install");
    }

    #[test]
    fn failure_message_defaults_to_program_name() {
        let spec = CommandSpec::new("Cloning", "git");
        assert_eq!(spec.failure_message(), "git failed");

        let spec = spec.fail_message("clone went wrong");
        assert_eq!(spec.failure_message(), "clone went wrong");
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let spec = CommandSpec::new("Nothing", "kickoff-definitely-not-a-real-binary");

        let error = SystemRunner.run(&spec).unwrap_err();

        assert!(matches!(error, ExecutionError::Spawn { .. }));
        assert_eq!(error.to_string(), "kickoff-definitely-not-a-real-binary failed");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_failure_with_stderr() {
        let spec = CommandSpec::new("Failing", "sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .fail_message("custom failure");

        let error = SystemRunner.run(&spec).unwrap_err();

        match error {
            ExecutionError::Failed {
                message,
                code,
                stderr,
                ..
            } => {
                assert_eq!(message, "custom failure");
                assert_eq!(code, Some(3));
                assert_eq!(stderr.as_deref(), Some("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("Touching", "sh")
            .args(["-c", "touch marker"])
            .cwd(dir.path());

        SystemRunner.run(&spec).unwrap();

        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn preflight_carries_install_link() {
        let error = check_installed(
            &SystemRunner,
            "frobnicator",
            "kickoff-definitely-not-a-real-binary",
            "https://example.com/install",
            false,
        )
        .unwrap_err();

        assert_eq!(error.tool, "frobnicator");
        assert!(error.hint.contains("https://example.com/install"));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let input = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");

        let tail = stderr_tail(&input).unwrap();

        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.ends_with("29"));
        assert_eq!(stderr_tail("\n  \n"), None);
    }
}
