use crate::answers::{Answers, IN_TRAINING, PROJECT_NAME, URL_REPOSITORY};
use inquire::{
    required,
    validator::{ErrorMessage, Validation},
    Confirm, InquireError, Select, Text,
};
use miette::Diagnostic;
use thiserror::Error;

const NODE_VERSIONS: [&str; 3] = ["22", "20", "18"];

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("Prompt was canceled by the user")]
    #[diagnostic(code(kickoff::prompt::canceled), help("Run kickoff again to start over"))]
    Canceled,

    #[error("Unable to read answer for '{question}'")]
    #[diagnostic(code(kickoff::prompt::inquire))]
    Inquire {
        question: String,
        #[source]
        source: InquireError,
    },

    #[error("Missing required answer: {question}")]
    #[diagnostic(code(kickoff::prompt::missing_answer))]
    MissingAnswer { question: String },
}
impl PromptError {
    fn from_inquire(question: &str, error: InquireError) -> Self {
        match error {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => Self::Canceled,
            other => Self::Inquire {
                question: question.to_string(),
                source: other,
            },
        }
    }
}

/// Collects the answer set for a run.
pub trait Prompter {
    fn answers(&self) -> Result<Answers, PromptError>;
}

/// Asks every question on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractivePrompter;

impl Prompter for InteractivePrompter {
    fn answers(&self) -> Result<Answers, PromptError> {
        let mut answers = Answers::new();

        let project_name = Text::new("Project name:")
            .with_help_message("Used as the directory and the package name")
            .with_validator(required!("projectName is required"))
            .with_validator(|input: &str| {
                Ok(match validate_package_name(input) {
                    Ok(()) => Validation::Valid,
                    Err(message) => Validation::Invalid(ErrorMessage::Custom(message)),
                })
            })
            .prompt()
            .map_err(|error| PromptError::from_inquire(PROJECT_NAME, error))?;
        answers.insert(PROJECT_NAME, project_name.trim());

        let description = Text::new("Project description:")
            .prompt()
            .map_err(|error| PromptError::from_inquire("projectDescription", error))?;
        answers.insert("projectDescription", description);

        let node_version = Select::new("Node version:", NODE_VERSIONS.to_vec())
            .prompt()
            .map_err(|error| PromptError::from_inquire("nodeVersion", error))?;
        answers.insert("nodeVersion", node_version);

        let testing = confirm("testing", "Add unit testing with jest?", true)?;
        answers.insert("testing", testing);

        let docker = confirm("docker", "Add a Dockerfile?", false)?;
        answers.insert("docker", docker);

        let ci = if testing {
            confirm("ci", "Run the test suite on CI?", true)?
        } else {
            false
        };
        answers.insert("ci", ci);

        let in_training = confirm(IN_TRAINING, "Is this a training project?", false)?;
        answers.insert(IN_TRAINING, in_training);

        let url = Text::new("Repository url:")
            .with_help_message("Leave empty to skip cloning and the initial commit")
            .prompt()
            .map_err(|error| PromptError::from_inquire(URL_REPOSITORY, error))?;
        answers.insert(URL_REPOSITORY, url.trim());

        Ok(answers)
    }
}

fn confirm(key: &str, message: &str, default: bool) -> Result<bool, PromptError> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .map_err(|error| PromptError::from_inquire(key, error))
}

/// npm package names are lower case, url safe, and at most 214 characters.
pub fn validate_package_name(input: &str) -> Result<(), String> {
    let name = input.trim();

    if name.len() > 214 {
        return Err("Project name can't be longer than 214 characters".to_string());
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err("Project name can't start with a dot or an underscore".to_string());
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err("Project name must be lower case".to_string());
    }
    if let Some(invalid) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
    {
        return Err(format!("Project name can't contain '{invalid}'"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_npm_style_names() {
        assert!(validate_package_name("demo").is_ok());
        assert!(validate_package_name("my-api.v2").is_ok());
        assert!(validate_package_name("node_kickoff").is_ok());
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(validate_package_name("Demo").is_err());
        assert!(validate_package_name("my app").is_err());
        assert!(validate_package_name(".hidden").is_err());
        assert!(validate_package_name("_private").is_err());
        assert!(validate_package_name("a/b").is_err());
        assert!(validate_package_name(&"a".repeat(215)).is_err());
    }

    #[test]
    fn cancellation_is_not_an_inquire_error() {
        assert!(matches!(
            PromptError::from_inquire("x", InquireError::OperationCanceled),
            PromptError::Canceled
        ));
        assert!(matches!(
            PromptError::from_inquire("x", InquireError::NotTTY),
            PromptError::Inquire { .. }
        ));
    }
}
