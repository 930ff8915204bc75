//! Study plan prompt construction and one-shot generation.

use prepagent_gemini::{GenerateRequest, ModelBackend};
use prepagent_shared::{KnowledgeSnippet, PlanConfig, PrepAgentError, Result};
use tracing::{info, instrument, warn};

/// Returned in place of a plan when the model answers with no text.
pub const PLAN_FALLBACK: &str = "Failed to generate plan.";

/// Shown to the user when the plan request itself fails.
pub const PLAN_FAILURE_NOTICE: &str =
    "Failed to generate plan. Please check your API key and try again.";

/// Render the knowledge base as labeled source blocks separated by blank lines.
pub fn format_plan_sources(snippets: &[KnowledgeSnippet]) -> String {
    snippets
        .iter()
        .map(|s| format!("--- Source: {} ---\n{}", s.title, s.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the single prompt used for study plan generation.
pub fn build_plan_prompt(role: &str, job_description: &str, snippets: &[KnowledgeSnippet]) -> String {
    let sources = format_plan_sources(snippets);

    format!(
        "You are an expert technical career coach.

TARGET ROLE: {role}

JOB DESCRIPTION (JD):
{job_description}

CANDIDATE'S KNOWLEDGE BASE (unorganized notes and materials):
{sources}

TASK:
Compare the knowledge base with the job description and write a complete,
structured study plan and preparation guide.

REQUIREMENTS:
1. Gaps: call out every skill or topic the JD asks for that the knowledge base does not cover.
2. Structure: reorganize the existing notes into logical interview topics.
3. Curation: summarize the key points from the notes that matter for this JD instead of only listing topics.
4. Case studies: include example case studies relevant to this role.
5. Format the whole answer as clean, readable Markdown.
"
    )
}

/// Issue one non-streaming generation request and return the plan markdown.
///
/// The model's text is returned verbatim; an answer with no text yields
/// [`PLAN_FALLBACK`]. Backend failures become [`PrepAgentError::Generation`].
#[instrument(skip_all, fields(role = %role, snippets = snippets.len(), model = %config.model))]
pub async fn generate_study_plan(
    backend: &dyn ModelBackend,
    config: &PlanConfig,
    role: &str,
    job_description: &str,
    snippets: &[KnowledgeSnippet],
) -> Result<String> {
    let request = GenerateRequest {
        model: config.model.clone(),
        prompt: build_plan_prompt(role, job_description, snippets),
        system_instruction: Some(config.system_instruction.clone()),
        thinking_budget: Some(config.thinking_budget),
    };

    let response = backend.generate(request).await.map_err(|e| {
        warn!(error = %e, "study plan generation failed");
        PrepAgentError::Generation(e.to_string())
    })?;

    match response.text {
        Some(text) if !text.is_empty() => {
            info!(plan_len = text.len(), "study plan generated");
            Ok(text)
        }
        _ => {
            warn!("model returned no plan text");
            Ok(PLAN_FALLBACK.to_string())
        }
    }
}

/// User-facing message for a failed plan request.
pub fn plan_error_notice(err: &PrepAgentError) -> String {
    if err.is_validation() {
        err.to_string()
    } else {
        PLAN_FAILURE_NOTICE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::new_snippet;
    use crate::testing::ScriptedBackend;
    use prepagent_gemini::GenerateResponse;

    fn notes() -> Vec<KnowledgeSnippet> {
        vec![new_snippet("Notes", "X").unwrap()]
    }

    #[test]
    fn prompt_embeds_sources_role_and_jd() {
        let prompt = build_plan_prompt("Backend Engineer", "Build APIs", &notes());
        assert!(prompt.contains("--- Source: Notes ---\nX"));
        assert!(prompt.contains("TARGET ROLE: Backend Engineer"));
        assert!(prompt.contains("Build APIs"));
        assert!(prompt.contains("Markdown"));
    }

    #[test]
    fn sources_are_separated_by_blank_lines() {
        let snippets = vec![
            new_snippet("B", "second").unwrap(),
            new_snippet("A", "first").unwrap(),
        ];
        assert_eq!(
            format_plan_sources(&snippets),
            "--- Source: B ---\nsecond\n\n--- Source: A ---\nfirst"
        );
    }

    #[tokio::test]
    async fn returns_model_text_verbatim() {
        let backend = ScriptedBackend::new().with_generate(Ok(GenerateResponse {
            text: Some("# Plan\n\n- gaps".into()),
        }));

        let plan = generate_study_plan(
            &backend,
            &PlanConfig::default(),
            "Backend Engineer",
            "Build APIs",
            &notes(),
        )
        .await
        .unwrap();

        assert_eq!(plan, "# Plan\n\n- gaps");

        let requests = backend.generate_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-3-pro-preview");
        assert_eq!(requests[0].thinking_budget, Some(2048));
        assert_eq!(
            requests[0].system_instruction.as_deref(),
            Some("You are a precise and structured educational assistant.")
        );
        assert!(requests[0].prompt.contains("--- Source: Notes ---\nX"));
    }

    #[tokio::test]
    async fn empty_answer_falls_back() {
        for text in [None, Some(String::new())] {
            let backend = ScriptedBackend::new().with_generate(Ok(GenerateResponse { text }));
            let plan = generate_study_plan(&backend, &PlanConfig::default(), "r", "jd", &notes())
                .await
                .unwrap();
            assert_eq!(plan, "Failed to generate plan.");
        }
    }

    #[tokio::test]
    async fn backend_failure_is_generation_error() {
        let backend = ScriptedBackend::new()
            .with_generate(Err(PrepAgentError::Network("connection refused".into())));

        let err = generate_study_plan(&backend, &PlanConfig::default(), "r", "jd", &notes())
            .await
            .unwrap_err();

        assert!(matches!(err, PrepAgentError::Generation(ref m) if m.contains("connection refused")));
        assert_eq!(plan_error_notice(&err), PLAN_FAILURE_NOTICE);
        assert_eq!(backend.generate_requests().len(), 1);
    }
}
