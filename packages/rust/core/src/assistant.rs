//! Application state and the operations the front end drives.
//!
//! [`Assistant`] owns the knowledge base, the current study plan and the
//! interview conversation. Every mutation goes through `&mut self`, so the
//! front end keeps it on its UI loop. Model work is split off into owned
//! requests ([`PlanRequest`], [`TurnRequest`]) that can run on another task
//! and report their results back.

use std::path::Path;
use std::sync::Arc;

use prepagent_gemini::ModelBackend;
use prepagent_shared::{
    AppConfig, ChatMessage, KnowledgeSnippet, PlanConfig, PrepAgentError, Result, SnippetId,
    StudyPlan,
};
use tracing::{info, instrument, warn};

use crate::aggregator::{MessagePublisher, StreamAggregator, aggregate};
use crate::conversation::{Conversation, TurnOutcome};
use crate::knowledge::{KnowledgeStore, new_snippet, snippet_from_file};
use crate::plan::generate_study_plan;
use crate::session::{ChatSession, build_system_instruction};

const MISSING_PLAN_INPUTS: &str = "Please provide both a Target Role and a Job Description.";
const EMPTY_KNOWLEDGE: &str = "Please add at least one item to your Knowledge Base first.";

// ---------------------------------------------------------------------------
// Detached requests
// ---------------------------------------------------------------------------

/// A validated plan generation, detached from the assistant state.
pub struct PlanRequest {
    backend: Arc<dyn ModelBackend>,
    config: PlanConfig,
    role: String,
    job_description: String,
    snippets: Vec<KnowledgeSnippet>,
}

impl PlanRequest {
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Call the model and build the resulting plan.
    pub async fn run(self) -> Result<StudyPlan> {
        let generated_plan = generate_study_plan(
            self.backend.as_ref(),
            &self.config,
            &self.role,
            &self.job_description,
            &self.snippets,
        )
        .await?;

        Ok(StudyPlan {
            role: self.role,
            job_description: self.job_description,
            generated_plan,
        })
    }
}

/// One interview turn: the session, the user's message, and the placeholder it fills.
pub struct TurnRequest {
    session: ChatSession,
    message: String,
    aggregator: StreamAggregator,
}

impl TurnRequest {
    pub fn message_id(&self) -> prepagent_shared::MessageId {
        self.aggregator.message_id()
    }

    /// Open the stream and aggregate it, publishing every snapshot.
    ///
    /// Never fails: errors are carried in the returned [`TurnOutcome`].
    #[instrument(skip_all, fields(id = %self.aggregator.message_id()))]
    pub async fn run(mut self, publisher: &mut dyn MessagePublisher) -> TurnOutcome {
        let (opened, result) = match self.session.send(&self.message).await {
            Ok(stream) => (true, aggregate(stream, &mut self.aggregator, publisher).await),
            Err(e) => {
                warn!(error = %e, "could not open chat stream");
                publisher.publish(&self.aggregator.fail());
                (false, Err(e))
            }
        };

        TurnOutcome {
            message: self.aggregator.snapshot(),
            phase: self.aggregator.phase(),
            opened,
            error: result.err(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// All in-memory state for one run of the application.
pub struct Assistant {
    config: AppConfig,
    backend: Arc<dyn ModelBackend>,
    knowledge: KnowledgeStore,
    plan: Option<StudyPlan>,
    conversation: Conversation,
}

impl Assistant {
    pub fn new(config: AppConfig, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            config,
            backend,
            knowledge: KnowledgeStore::new(),
            plan: None,
            conversation: Conversation::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -- knowledge ----------------------------------------------------------

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Add a typed note. Blank fields are rejected.
    pub fn add_snippet(&mut self, title: &str, content: &str) -> Result<SnippetId> {
        let snippet = new_snippet(title, content)?;
        let id = snippet.id;
        self.knowledge.add(snippet);
        Ok(id)
    }

    /// Import a text file as a note titled after the file name.
    pub fn import_snippet(&mut self, path: &Path) -> Result<SnippetId> {
        let snippet = snippet_from_file(path)?;
        let id = snippet.id;
        info!(path = %path.display(), title = %snippet.title, "imported note");
        self.knowledge.add(snippet);
        Ok(id)
    }

    pub fn remove_snippet(&mut self, id: &SnippetId) -> Option<KnowledgeSnippet> {
        self.knowledge.remove(id)
    }

    // -- study plan ---------------------------------------------------------

    pub fn plan(&self) -> Option<&StudyPlan> {
        self.plan.as_ref()
    }

    /// Validate inputs and snapshot everything a plan generation needs.
    ///
    /// Nothing is sent when validation fails.
    pub fn plan_request(&self, role: &str, job_description: &str) -> Result<PlanRequest> {
        if role.trim().is_empty() || job_description.trim().is_empty() {
            return Err(PrepAgentError::validation(MISSING_PLAN_INPUTS));
        }
        if self.knowledge.is_empty() {
            return Err(PrepAgentError::validation(EMPTY_KNOWLEDGE));
        }

        Ok(PlanRequest {
            backend: Arc::clone(&self.backend),
            config: self.config.plan.clone(),
            role: role.to_string(),
            job_description: job_description.to_string(),
            snippets: self.knowledge.list().to_vec(),
        })
    }

    /// Install a freshly generated plan. The conversation starts over.
    pub fn set_plan(&mut self, plan: StudyPlan) {
        info!(role = %plan.role, plan_len = plan.generated_plan.len(), "study plan set");
        self.plan = Some(plan);
        self.reset_conversation();
    }

    /// Drop the current plan. The conversation starts over.
    pub fn clear_plan(&mut self) -> Option<StudyPlan> {
        let previous = self.plan.take();
        if previous.is_some() {
            self.reset_conversation();
        }
        previous
    }

    /// Validate, generate and install a plan in one step.
    pub async fn generate_plan(&mut self, role: &str, job_description: &str) -> Result<()> {
        let plan = self.plan_request(role, job_description)?.run().await?;
        self.set_plan(plan);
        Ok(())
    }

    /// Role the interviewer frames the conversation around.
    pub fn context_role(&self) -> &str {
        self.plan
            .as_ref()
            .map(|p| p.role.as_str())
            .unwrap_or(self.config.chat.default_role.as_str())
    }

    // -- conversation -------------------------------------------------------

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    /// Start a new turn and return the detached work that streams the answer.
    ///
    /// The user message and a thinking placeholder are visible immediately.
    pub fn begin_turn(&mut self, text: &str) -> Result<TurnRequest> {
        let system_instruction = build_system_instruction(self.knowledge.list(), self.context_role());
        let (history, aggregator) = self.conversation.begin(text)?;
        let session = ChatSession::new(
            Arc::clone(&self.backend),
            &self.config.chat,
            system_instruction,
            &history,
        );

        Ok(TurnRequest {
            session,
            message: text.to_string(),
            aggregator,
        })
    }

    /// Show a newer snapshot of the in-flight message.
    pub fn apply_snapshot(&mut self, snapshot: ChatMessage) -> bool {
        self.conversation.apply(snapshot)
    }

    /// Close the in-flight turn with its outcome.
    pub fn finish_turn(&mut self, outcome: TurnOutcome) {
        self.conversation.finish(outcome);
    }

    /// Start a new conversation from the welcome message.
    ///
    /// Results still arriving for an abandoned turn are ignored.
    pub fn reset_conversation(&mut self) {
        if self.conversation.is_loading() {
            warn!("resetting conversation with a turn in flight");
        }
        self.conversation = Conversation::new(self.plan.as_ref());
    }

    /// Send a message and stream the answer into the conversation inline.
    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        let request = self.begin_turn(text)?;
        let conversation = &mut self.conversation;
        let mut publish = |snapshot: &ChatMessage| {
            conversation.apply(snapshot.clone());
        };
        let outcome = request.run(&mut publish).await;
        self.conversation.finish(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::StreamPhase;
    use crate::conversation::STREAM_ERROR_NOTICE;
    use crate::plan::{PLAN_FAILURE_NOTICE, PLAN_FALLBACK, plan_error_notice};
    use crate::testing::ScriptedBackend;
    use prepagent_gemini::{ChatIncrement, GenerateResponse};
    use prepagent_shared::{ChatRole, Source};

    fn assistant(backend: ScriptedBackend) -> (Assistant, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let assistant = Assistant::new(AppConfig::default(), backend.clone());
        (assistant, backend)
    }

    fn source(uri: &str, title: &str) -> Source {
        Source {
            uri: uri.into(),
            title: title.into(),
        }
    }

    fn texts(assistant: &Assistant) -> Vec<&str> {
        assistant.messages().iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn generates_plan_from_knowledge() {
        let (mut assistant, backend) = assistant(ScriptedBackend::new().with_generate(Ok(
            GenerateResponse {
                text: Some("# Plan".into()),
            },
        )));
        assistant.add_snippet("Notes", "X").unwrap();

        assistant
            .generate_plan("Backend Engineer", "Build APIs")
            .await
            .unwrap();

        let plan = assistant.plan().unwrap();
        assert_eq!(plan.generated_plan, "# Plan");
        assert_eq!(plan.role, "Backend Engineer");
        assert_eq!(plan.job_description, "Build APIs");
        assert!(
            backend.generate_requests()[0]
                .prompt
                .contains("--- Source: Notes ---\nX")
        );
        assert!(assistant.messages()[0].text.contains("**Backend Engineer**"));
    }

    #[tokio::test]
    async fn empty_knowledge_is_rejected_without_a_request() {
        let (mut assistant, backend) = assistant(ScriptedBackend::new());

        let err = assistant
            .generate_plan("Backend Engineer", "Build APIs")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), EMPTY_KNOWLEDGE);
        assert_eq!(plan_error_notice(&err), EMPTY_KNOWLEDGE);
        assert!(backend.generate_requests().is_empty());
        assert!(assistant.plan().is_none());
    }

    #[tokio::test]
    async fn missing_role_or_jd_is_rejected_first() {
        let (mut assistant, backend) = assistant(ScriptedBackend::new());

        for (role, jd) in [("", "Build APIs"), ("Backend Engineer", "  ")] {
            let err = assistant.generate_plan(role, jd).await.unwrap_err();
            assert_eq!(err.to_string(), MISSING_PLAN_INPUTS);
        }
        assert!(backend.generate_requests().is_empty());
    }

    #[tokio::test]
    async fn empty_model_answer_installs_fallback_plan() {
        let (mut assistant, _) =
            assistant(ScriptedBackend::new().with_generate(Ok(GenerateResponse { text: None })));
        assistant.add_snippet("Notes", "X").unwrap();

        assistant.generate_plan("r", "jd").await.unwrap();

        assert_eq!(assistant.plan().unwrap().generated_plan, PLAN_FALLBACK);
    }

    #[tokio::test]
    async fn failed_generation_keeps_previous_plan() {
        let (mut assistant, _) = assistant(
            ScriptedBackend::new()
                .with_generate(Ok(GenerateResponse {
                    text: Some("first".into()),
                }))
                .with_generate(Err(PrepAgentError::Api {
                    status: 403,
                    message: "API key not valid".into(),
                })),
        );
        assistant.add_snippet("Notes", "X").unwrap();
        assistant.generate_plan("r", "jd").await.unwrap();

        let err = assistant.generate_plan("r2", "jd2").await.unwrap_err();

        assert_eq!(plan_error_notice(&err), PLAN_FAILURE_NOTICE);
        assert_eq!(assistant.plan().unwrap().generated_plan, "first");
    }

    #[tokio::test]
    async fn streamed_answer_accumulates_with_unique_sources() {
        let (mut assistant, backend) = assistant(ScriptedBackend::new().with_stream(Ok(vec![
            Ok(ChatIncrement::text("Hel")),
            Ok(ChatIncrement {
                text: Some("lo".into()),
                citations: vec![source("a.com", "A")],
            }),
            Ok(ChatIncrement {
                text: None,
                citations: vec![source("a.com", "A2")],
            }),
        ])));

        assistant.send_message("Hi").await.unwrap();

        let last = assistant.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Model);
        assert_eq!(last.text, "Hello");
        assert_eq!(last.sources.as_deref(), Some(&[source("a.com", "A")][..]));
        assert!(!last.is_thinking);
        assert!(!assistant.is_loading());

        let request = &backend.chat_requests()[0];
        assert_eq!(request.message, "Hi");
        // Only the welcome message precedes the new turn.
        assert_eq!(request.history.len(), 1);
        assert!(request.system_instruction.contains("\"General Interview Candidate\""));
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_partial_text() {
        let (mut assistant, _) = assistant(ScriptedBackend::new().with_stream(Ok(vec![
            Ok(ChatIncrement::text("Par")),
            Err(PrepAgentError::Stream("reset".into())),
        ])));

        assistant.send_message("Hi").await.unwrap();

        assert_eq!(texts(&assistant)[1..], ["Hi", "Par", STREAM_ERROR_NOTICE]);
        assert!(!assistant.is_loading());
    }

    #[tokio::test]
    async fn failure_to_open_stream_reports_notice() {
        let (mut assistant, _) = assistant(
            ScriptedBackend::new().with_stream(Err(PrepAgentError::Network("refused".into()))),
        );

        assistant.send_message("Hi").await.unwrap();

        assert_eq!(texts(&assistant)[1..], ["Hi", STREAM_ERROR_NOTICE]);
    }

    #[tokio::test]
    async fn opened_stream_failing_without_text_keeps_message() {
        let (mut assistant, _) = assistant(ScriptedBackend::new().with_stream(Ok(vec![
            Ok(ChatIncrement::text("")),
            Err(PrepAgentError::Stream("reset".into())),
        ])));

        assistant.send_message("Hi").await.unwrap();

        assert_eq!(texts(&assistant)[1..], ["Hi", "", STREAM_ERROR_NOTICE]);
        let kept = &assistant.messages()[2];
        assert_eq!(kept.role, ChatRole::Model);
        assert!(!kept.is_thinking);
        assert!(!assistant.is_loading());
    }

    #[tokio::test]
    async fn detached_turn_publishes_monotonic_snapshots() {
        let (mut assistant, _) = assistant(ScriptedBackend::new().with_stream(Ok(vec![
            Ok(ChatIncrement::text("a")),
            Ok(ChatIncrement::default()),
            Ok(ChatIncrement::text("b")),
        ])));

        let request = assistant.begin_turn("Hi").unwrap();
        let id = request.message_id();
        assert!(assistant.is_loading());
        assert!(matches!(assistant.begin_turn("again"), Err(e) if e.is_validation()));

        let mut snapshots = Vec::new();
        let mut publish = |m: &ChatMessage| snapshots.push(m.clone());
        let outcome = request.run(&mut publish).await;

        assert_eq!(outcome.phase, StreamPhase::Complete);
        assert!(snapshots.iter().all(|s| s.id == id));
        for pair in snapshots.windows(2) {
            assert!(pair[1].text.starts_with(&pair[0].text));
        }

        for snapshot in snapshots {
            assistant.apply_snapshot(snapshot);
        }
        assistant.finish_turn(outcome);
        assert_eq!(assistant.messages().last().unwrap().text, "ab");
        assert!(!assistant.is_loading());
    }

    #[tokio::test]
    async fn plan_change_resets_conversation_and_ignores_stale_turn() {
        let (mut assistant, _) = assistant(
            ScriptedBackend::new().with_stream(Ok(vec![Ok(ChatIncrement::text("late"))])),
        );
        let request = assistant.begin_turn("Hi").unwrap();

        assistant.set_plan(StudyPlan {
            role: "SRE".into(),
            job_description: "On call".into(),
            generated_plan: "# Plan".into(),
        });
        assert_eq!(assistant.messages().len(), 1);
        assert!(!assistant.is_loading());
        assert_eq!(assistant.context_role(), "SRE");

        let mut ignored = |_: &ChatMessage| {};
        let outcome = request.run(&mut ignored).await;
        assistant.finish_turn(outcome);
        assert_eq!(assistant.messages().len(), 1);
    }

    #[test]
    fn clearing_plan_restores_default_role() {
        let (mut assistant, _) = assistant(ScriptedBackend::new());
        assistant.set_plan(StudyPlan {
            role: "SRE".into(),
            job_description: "On call".into(),
            generated_plan: "# Plan".into(),
        });

        let previous = assistant.clear_plan().unwrap();
        assert_eq!(previous.role, "SRE");
        assert_eq!(assistant.context_role(), "General Interview Candidate");
        assert!(assistant.messages()[0].text.starts_with("Please generate"));
    }

    #[test]
    fn knowledge_round_trip_through_assistant() {
        let (mut assistant, _) = assistant(ScriptedBackend::new());
        let id = assistant.add_snippet("Rust", "borrowck").unwrap();
        assert!(assistant.add_snippet("", "x").is_err());
        assert_eq!(assistant.knowledge().len(), 1);

        assert!(assistant.remove_snippet(&id).is_some());
        assert!(assistant.remove_snippet(&id).is_none());
        assert!(assistant.knowledge().is_empty());
    }
}
