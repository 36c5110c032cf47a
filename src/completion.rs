use serde::{Deserialize, Serialize};

/// When typing alone (without the countdown running out) ends a session
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Finish as soon as the input is at least as long as the target,
    /// whatever the trailing characters are.
    #[default]
    LengthReached,
    /// Finish only once the input equals the target exactly.
    ExactMatch,
}

impl CompletionPolicy {
    pub fn is_complete(&self, target: &str, input: &str) -> bool {
        match self {
            CompletionPolicy::LengthReached => {
                input.chars().count() >= target.chars().count()
            }
            CompletionPolicy::ExactMatch => input == target,
        }
    }
}
