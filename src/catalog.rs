//! The templates a kickoff project is made of, and the answers forced on training projects.

use crate::{answers::Answers, template::FileDescriptor};

fn testing(answers: &Answers) -> bool {
    answers.flag("testing")
}

fn docker(answers: &Answers) -> bool {
    answers.flag("docker")
}

fn ci(answers: &Answers) -> bool {
    answers.flag("testing") && answers.flag("ci")
}

/// Every candidate template, in the order it is materialized.
pub const FILES: &[FileDescriptor] = &[
    FileDescriptor::new("package.json"),
    FileDescriptor::new("README.md"),
    // stored without the leading dot: npm drops these names from published packages
    FileDescriptor::new("gitignore").renamed(".gitignore"),
    FileDescriptor::new("npmrc").renamed(".npmrc"),
    FileDescriptor::new("nvmrc").renamed(".nvmrc"),
    FileDescriptor::new(".eslintrc.ejs"),
    FileDescriptor::new("eslintignore").renamed(".eslintignore"),
    FileDescriptor::new("server.ejs"),
    FileDescriptor::new("app.ejs"),
    FileDescriptor::new("index.ejs").in_dir("config"),
    FileDescriptor::new("routes.ejs").in_dir("app"),
    FileDescriptor::new("health.ejs").in_dir("app/controllers"),
    FileDescriptor::new("jest.config.ejs").when(testing),
    FileDescriptor::new("app.spec.ejs").in_dir("test").when(testing),
    FileDescriptor::new("Dockerfile").when(docker),
    FileDescriptor::new("dockerignore")
        .renamed(".dockerignore")
        .when(docker),
    FileDescriptor::new("ci.yml").in_dir(".github/workflows").when(ci),
];

/// Answers applied on top of the user's when a project is marked as training.
pub fn training_preset() -> Answers {
    Answers::new()
        .with("nodeVersion", "20")
        .with("testing", true)
        .with("ci", true)
        .with("docker", false)
}
