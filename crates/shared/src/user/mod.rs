use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Soft-disable flag. Users are never hard-deleted.
#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Active,
    Suspended,
}

/// Paid tools unlocked by a trial or a subscription.
#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    QuestionGenerator,
    WritingEvaluator,
    TextQuestionAnalysis,
}

impl Tool {
    pub fn ids() -> impl Iterator<Item = String> {
        Self::VARIANTS.iter().map(|tool| tool.to_string())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::QuestionGenerator => "Question Generator",
            Tool::WritingEvaluator => "Writing Evaluator",
            Tool::TextQuestionAnalysis => "Text & Question Analysis",
        }
    }
}
