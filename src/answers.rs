use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tera::Context;

pub const PROJECT_NAME: &str = "projectName";
pub const URL_REPOSITORY: &str = "urlRepository";
pub const IN_TRAINING: &str = "inTraining";

/// A single scalar answer. Serialized untagged so templates see plain values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    String(String),
}
impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
impl From<String> for Answer {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// The answers collected at the start of a run, in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(pub IndexMap<String, Answer>);
impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, answer: impl Into<Answer>) {
        self.0.insert(key.into(), answer.into());
    }

    /// Builder form of [`Answers::insert`].
    pub fn with(mut self, key: impl Into<String>, answer: impl Into<Answer>) -> Self {
        self.insert(key, answer);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Answer> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Answer::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// `true` only for a boolean answer set to `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Answer::Bool(true)))
    }

    pub fn project_name(&self) -> Option<&str> {
        self.get_str(PROJECT_NAME)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// A repository is used whenever the user gave a non-blank remote url.
    pub fn use_git(&self) -> bool {
        self.repository_url().is_some()
    }

    pub fn repository_url(&self) -> Option<&str> {
        self.get_str(URL_REPOSITORY)
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Overlays `preset` on top of these answers. Preset values win on key collision,
    /// keys only present in the preset are appended in preset order.
    pub fn with_preset(mut self, preset: &Answers) -> Self {
        for (key, answer) in &preset.0 {
            self.0.insert(key.clone(), answer.clone());
        }
        self
    }

    /// Makes a [`Context`] hydrated with every answer.
    pub fn to_context(&self) -> Context {
        let mut context = Context::new();
        for (key, answer) in &self.0 {
            match answer {
                Answer::String(value) => context.insert(key, value),
                Answer::Bool(value) => context.insert(key, value),
            }
        }
        context
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
