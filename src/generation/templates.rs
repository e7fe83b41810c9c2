//! Fixed instruction templates sent to the generation model.
//!
//! The wording is part of the contract with the model: changing a single
//! character changes what comes back.

use std::collections::BTreeMap;

use super::task::Lifestyle;

/// Template for article summaries.
pub const SUMMARIZE_TEMPLATE: &str = "
You are a medical writer helping the general public understand health articles.

ARTICLE:
{text}

INSTRUCTIONS:
- Use non-technical language for general understanding
- Highlight symptoms, causes, treatments, and prevention if relevant
- Keep it organized and easy to read

SUMMARY:
";

/// Template for health questions.
pub const ANSWER_TEMPLATE: &str = "
You are a knowledgeable and responsible health assistant.

QUESTION:
{question}

{context_section}

INSTRUCTIONS:
- Provide medically accurate, general health advice
- Reference common symptoms, treatments, or wellness tips when relevant
- If unsure, recommend seeing a healthcare provider
- Keep responses understandable to a general audience

ANSWER:
";

/// Template for wellness tips.
pub const TIPS_TEMPLATE: &str = "
You are a health coach creating personalized wellness tips.

USER PROFILE:
- Health Goal: {goal}
- Lifestyle: {lifestyle}
- Existing Conditions/Concerns: {conditions}

INSTRUCTIONS:
- Provide 5-7 actionable health and wellness tips
- Tailor suggestions to the user's goal and lifestyle
- Include advice on diet, physical activity, stress, or sleep if applicable
- Be practical and supportive

HEALTH TIPS:
";

/// Replace every `{name}` placeholder with its value.
///
/// Substitution is single-pass: braces inside a value are copied as-is and
/// never re-expanded. Unknown placeholders are left untouched.
#[must_use]
pub fn render(template: &str, fields: &BTreeMap<&'static str, String>) -> String {
    let values_len: usize = fields.values().map(String::len).sum();
    let mut out = String::with_capacity(template.len() + values_len);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| fields.get(&after[..close]).map(|v| (close, v)));
        if let Some((close, v)) = value {
            out.push_str(v);
            rest = &after[close + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Build the context block for the answer template.
#[must_use]
pub fn context_section(context: Option<&str>) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => format!("\nADDITIONAL CONTEXT:\n{ctx}\n"),
        _ => String::new(),
    }
}

/// Template fields for a summary request.
#[must_use]
pub fn summarize_fields(text: &str) -> BTreeMap<&'static str, String> {
    BTreeMap::from([("text", text.to_string())])
}

/// Template fields for a question.
#[must_use]
pub fn answer_fields(question: &str, context: Option<&str>) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("question", question.to_string()),
        ("context_section", context_section(context)),
    ])
}

/// Template fields for a wellness-tips request.
#[must_use]
pub fn tips_fields(
    goal: &str,
    lifestyle: Lifestyle,
    conditions: Option<&str>,
) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("goal", goal.to_string()),
        ("lifestyle", lifestyle.label().to_string()),
        ("conditions", conditions.unwrap_or_default().to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_summarize_exact() {
        let prompt = render(SUMMARIZE_TEMPLATE, &summarize_fields("Flu season starts early."));
        let expected = "\nYou are a medical writer helping the general public understand health articles.\n\nARTICLE:\nFlu season starts early.\n\nINSTRUCTIONS:\n- Use non-technical language for general understanding\n- Highlight symptoms, causes, treatments, and prevention if relevant\n- Keep it organized and easy to read\n\nSUMMARY:\n";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_render_does_not_reexpand_values() {
        let prompt = render("A {text} B", &summarize_fields("{text} and {goal}"));
        assert_eq!(prompt, "A {text} and {goal} B");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let prompt = render("{missing} {text", &summarize_fields("x"));
        assert_eq!(prompt, "{missing} {text");
    }

    #[test]
    fn test_context_section() {
        assert_eq!(context_section(None), "");
        assert_eq!(context_section(Some("")), "");
        assert_eq!(
            context_section(Some("Prior summary")),
            "\nADDITIONAL CONTEXT:\nPrior summary\n"
        );
    }

    #[test]
    fn test_tips_fields_default_conditions() {
        let fields = tips_fields("Sleep better", Lifestyle::ModeratelyActive, None);
        assert_eq!(fields["lifestyle"], "Moderately Active");
        assert_eq!(fields["conditions"], "");
    }
}
