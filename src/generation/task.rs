//! Task kinds, user-facing enums and the transient request value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::templates::{self, ANSWER_TEMPLATE, SUMMARIZE_TEMPLATE, TIPS_TEMPLATE};

/// Default output budget for every task.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// The three generation tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Plain-language summary of a health article.
    Summarize,
    /// Answer to a general health question.
    Answer,
    /// Personalized wellness tips.
    Tips,
}

impl Task {
    /// Sampling temperature: low for factual summaries, higher for advice.
    #[must_use]
    pub const fn temperature(self) -> f64 {
        match self {
            Self::Summarize => 0.3,
            Self::Answer => 0.7,
            Self::Tips => 0.8,
        }
    }

    /// The instruction template for this task.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Summarize => SUMMARIZE_TEMPLATE,
            Self::Answer => ANSWER_TEMPLATE,
            Self::Tips => TIPS_TEMPLATE,
        }
    }

    /// Template variable that must be non-blank before any remote call.
    #[must_use]
    pub const fn required_field(self) -> &'static str {
        match self {
            Self::Summarize => "text",
            Self::Answer => "question",
            Self::Tips => "goal",
        }
    }

    /// Human name of the required input.
    #[must_use]
    pub const fn input_label(self) -> &'static str {
        match self {
            Self::Summarize => "article text",
            Self::Answer => "question",
            Self::Tips => "goal",
        }
    }

    /// Noun used in user-facing failure messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Summarize => "summary",
            Self::Answer => "answer",
            Self::Tips => "tips",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summarize => write!(f, "summarize"),
            Self::Answer => write!(f, "answer"),
            Self::Tips => write!(f, "tips"),
        }
    }
}

/// Self-reported activity level for wellness tips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifestyle {
    /// Little regular activity.
    #[default]
    #[serde(alias = "sedentary")]
    Sedentary,
    /// Some regular activity.
    #[serde(rename = "Moderately Active", alias = "moderately_active")]
    ModeratelyActive,
    /// Frequent intense activity.
    #[serde(rename = "Very Active", alias = "very_active")]
    VeryActive,
}

impl Lifestyle {
    /// All choices, in display order.
    pub const ALL: [Self; 3] = [Self::Sedentary, Self::ModeratelyActive, Self::VeryActive];

    /// Label shown to users and interpolated into the prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sedentary => "Sedentary",
            Self::ModeratelyActive => "Moderately Active",
            Self::VeryActive => "Very Active",
        }
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Lifestyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "sedentary" => Ok(Self::Sedentary),
            "moderately active" => Ok(Self::ModeratelyActive),
            "very active" => Ok(Self::VeryActive),
            _ => Err(format!("unknown lifestyle: {s}")),
        }
    }
}

/// Sampling parameters passed to the remote model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum number of generated tokens.
    pub max_output_tokens: u32,
}

impl SamplingParams {
    /// Parameters for `task` with the given output budget.
    #[must_use]
    pub const fn for_task(task: Task, max_output_tokens: u32) -> Self {
        Self {
            temperature: task.temperature(),
            max_output_tokens,
        }
    }
}

/// A single generation request. Never persisted.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Which task this is.
    pub task: Task,
    /// Template variable values.
    pub fields: BTreeMap<&'static str, String>,
    /// Caller-supplied API key.
    pub api_key: String,
}

impl GenerationRequest {
    /// Summary request.
    #[must_use]
    pub fn summarize(article_text: &str, api_key: &str) -> Self {
        Self {
            task: Task::Summarize,
            fields: templates::summarize_fields(article_text),
            api_key: api_key.to_string(),
        }
    }

    /// Question request, with optional prior context.
    #[must_use]
    pub fn answer(question: &str, context: Option<&str>, api_key: &str) -> Self {
        Self {
            task: Task::Answer,
            fields: templates::answer_fields(question, context),
            api_key: api_key.to_string(),
        }
    }

    /// Wellness-tips request.
    #[must_use]
    pub fn tips(goal: &str, lifestyle: Lifestyle, conditions: Option<&str>, api_key: &str) -> Self {
        Self {
            task: Task::Tips,
            fields: templates::tips_fields(goal, lifestyle, conditions),
            api_key: api_key.to_string(),
        }
    }

    /// Whether the task's required input is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields
            .get(self.task.required_field())
            .is_none_or(|value| value.trim().is_empty())
    }

    /// The filled template.
    #[must_use]
    pub fn prompt(&self) -> String {
        templates::render(self.task.template(), &self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperatures() {
        assert!((Task::Summarize.temperature() - 0.3).abs() < f64::EPSILON);
        assert!((Task::Answer.temperature() - 0.7).abs() < f64::EPSILON);
        assert!((Task::Tips.temperature() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lifestyle_parse() {
        assert_eq!("Moderately Active".parse::<Lifestyle>(), Ok(Lifestyle::ModeratelyActive));
        assert_eq!("very_active".parse::<Lifestyle>(), Ok(Lifestyle::VeryActive));
        assert_eq!(" sedentary ".parse::<Lifestyle>(), Ok(Lifestyle::Sedentary));
        assert!("couch".parse::<Lifestyle>().is_err());
    }

    #[test]
    fn test_lifestyle_serde_uses_labels() {
        let json = serde_json::to_string(&Lifestyle::VeryActive).unwrap_or_default();
        assert_eq!(json, "\"Very Active\"");
        let parsed: Lifestyle = serde_json::from_str("\"moderately_active\"")
            .unwrap_or(Lifestyle::Sedentary);
        assert_eq!(parsed, Lifestyle::ModeratelyActive);
    }

    #[test]
    fn test_request_prompt_uses_task_template() {
        let request = GenerationRequest::answer("Is coffee ok?", None, "key");
        let prompt = request.prompt();
        assert!(prompt.contains("QUESTION:\nIs coffee ok?\n\n\n\nINSTRUCTIONS:"));
        assert_eq!(request.task, Task::Answer);
    }

    #[test]
    fn test_blank_detection() {
        assert!(GenerationRequest::summarize("  \n\t", "key").is_blank());
        let request = GenerationRequest::tips("", Lifestyle::Sedentary, Some("asthma"), "key");
        assert!(request.is_blank());
        assert!(!GenerationRequest::answer("Why?", None, "key").is_blank());
    }
}
