//! Run Council use case
//!
//! Orchestrates the full three-stage deliberation: concurrent first
//! opinions, anonymized peer review, and chairman synthesis, streaming
//! progress to the caller as it happens.

use crate::config::CouncilConfig;
use crate::ports::llm_gateway::{
    ChatMessage, GatewayError, GenerationParams, LlmGateway, StreamEvent,
};
use crate::use_cases::build_context::RagContextBuilder;
use council_domain::{
    AnonymizedPanel, CouncilEvent, CouncilOutcome, CouncilStats, ModelAnswer, PeerRanking,
    PromptTemplate, Query, RagStats, Stage, parse_review_reply,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that end a council session.
#[derive(Error, Debug)]
pub enum RunCouncilError {
    #[error("No models configured")]
    NoModels,

    #[error("all models failed to respond")]
    AllModelsFailed,

    #[error("Chairman model failed: {0}")]
    ChairmanFailed(String),
}

/// Input for the RunCouncil use case.
#[derive(Debug, Clone)]
pub struct RunCouncilInput {
    /// The question to deliberate
    pub query: Query,
    /// Whether to augment the query from the knowledge base
    pub use_rag: bool,
    /// Restrict retrieval to these source ids
    pub source_filter: Option<Vec<u64>>,
    /// Whether augmentation should also screen for conflicts
    pub detect_conflicts: bool,
}

impl RunCouncilInput {
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            use_rag: false,
            source_filter: None,
            detect_conflicts: true,
        }
    }

    pub fn with_rag(mut self) -> Self {
        self.use_rag = true;
        self
    }

    pub fn with_source_filter(mut self, sources: Vec<u64>) -> Self {
        self.source_filter = Some(sources);
        self
    }

    pub fn without_conflict_detection(mut self) -> Self {
        self.detect_conflicts = false;
        self
    }
}

/// Sender half of the session's event stream.
pub type EventSender = mpsc::UnboundedSender<CouncilEvent>;

/// Use case for running a council deliberation.
///
/// The retrieval engine is an explicit optional dependency injected at
/// construction; augmentation is attempted only when both the dependency is
/// present and the input requests it.
pub struct RunCouncilUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    rag: Option<Arc<RagContextBuilder>>,
    config: CouncilConfig,
}

impl<G: LlmGateway + 'static> RunCouncilUseCase<G> {
    pub fn new(gateway: Arc<G>, config: CouncilConfig) -> Self {
        Self {
            gateway,
            rag: None,
            config,
        }
    }

    /// Wire in the retrieval engine.
    pub fn with_rag(mut self, rag: Arc<RagContextBuilder>) -> Self {
        self.rag = Some(rag);
        self
    }

    /// Execute without observing the event stream.
    pub async fn execute(&self, input: RunCouncilInput) -> Result<CouncilOutcome, RunCouncilError> {
        let (tx, rx) = mpsc::unbounded_channel();
        // No observer: sends become no-ops once the receiver is gone
        drop(rx);
        self.execute_streaming(input, tx).await
    }

    /// Execute, emitting [`CouncilEvent`]s as the session progresses.
    ///
    /// Event sends are best-effort: an abandoned receiver never blocks or
    /// fails the session, and already-delivered events are not retracted.
    pub async fn execute_streaming(
        &self,
        input: RunCouncilInput,
        events: EventSender,
    ) -> Result<CouncilOutcome, RunCouncilError> {
        if self.config.members.is_empty() {
            return Err(RunCouncilError::NoModels);
        }

        let started_at = Utc::now();
        info!(
            members = self.config.members.len(),
            "starting council deliberation"
        );

        // Optional augmentation; failure degrades to the plain query
        let (effective_query, rag_stats) = self.augment(&input, &events).await;

        // Stage 1: First Opinions
        let answers = self.stage_first_opinions(&effective_query, &events).await;
        let valid: Vec<ModelAnswer> = answers.iter().filter(|a| a.is_success()).cloned().collect();

        if valid.is_empty() {
            let _ = events.send(CouncilEvent::Error {
                model: None,
                message: "all models failed to respond".to_string(),
                fatal: true,
            });
            return Err(RunCouncilError::AllModelsFailed);
        }

        // Stage 2: Review (skipped with fewer than two valid answers)
        let rankings = if self.config.enable_review && valid.len() > 1 {
            self.stage_review(input.query.content(), &valid, &events)
                .await
        } else {
            debug!("skipping peer review stage");
            Vec::new()
        };

        // Stage 3: Final Response
        let final_answer = self
            .stage_final_response(input.query.content(), &valid, &rankings, &events)
            .await;
        let final_answer = match final_answer {
            Ok(text) => text,
            Err(e) => {
                let _ = events.send(CouncilEvent::Error {
                    model: Some(self.config.chairman.clone()),
                    message: e.to_string(),
                    fatal: true,
                });
                return Err(RunCouncilError::ChairmanFailed(e.to_string()));
            }
        };

        let stats = CouncilStats {
            models_used: self.config.members.clone(),
            answers_received: valid.len(),
            reviews_received: rankings.len(),
            rag: rag_stats.clone(),
        };
        let _ = events.send(CouncilEvent::Complete { stats });

        Ok(CouncilOutcome {
            query: input.query.into_content(),
            stage: Stage::Complete,
            answers,
            rankings,
            final_answer: Some(final_answer),
            chairman: self.config.chairman.clone(),
            models_used: self.config.members.clone(),
            rag: rag_stats,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Build the augmented query when retrieval is wired in and requested.
    ///
    /// A retrieval failure is fatal to augmentation only: the council
    /// proceeds with the unaugmented query.
    async fn augment(
        &self,
        input: &RunCouncilInput,
        events: &EventSender,
    ) -> (String, Option<RagStats>) {
        let plain = input.query.content().to_string();

        if !input.use_rag {
            return (plain, None);
        }
        let Some(rag) = &self.rag else {
            debug!("augmentation requested but no retrieval engine wired in");
            return (plain, None);
        };

        match rag
            .build(
                input.query.content(),
                input.source_filter.as_deref(),
                input.detect_conflicts,
            )
            .await
        {
            Ok(context) => {
                let _ = events.send(CouncilEvent::RagContext {
                    stats: context.stats.clone(),
                });
                for conflict in &context.conflicts {
                    let _ = events.send(CouncilEvent::ConflictDetected {
                        conflict: conflict.clone(),
                    });
                }

                if context.is_empty() {
                    (plain, Some(context.stats))
                } else {
                    (
                        rag.build_augmented_prompt(input.query.content(), &context),
                        Some(context.stats),
                    )
                }
            }
            Err(e) => {
                warn!("augmentation failed, proceeding unaugmented: {e}");
                let _ = events.send(CouncilEvent::Error {
                    model: None,
                    message: format!("retrieval unavailable, answering without context: {e}"),
                    fatal: false,
                });
                (plain, None)
            }
        }
    }

    /// Stage 1: fan the query out to every member concurrently.
    ///
    /// Answers are emitted in the order models complete, not submission
    /// order; a per-model failure is recorded on its answer and the session
    /// continues.
    async fn stage_first_opinions(
        &self,
        query: &str,
        events: &EventSender,
    ) -> Vec<ModelAnswer> {
        let _ = events.send(CouncilEvent::StageUpdate {
            stage: Stage::FirstOpinions,
            message: "Gathering initial responses from council members...".to_string(),
        });

        let params = GenerationParams::default()
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let mut join_set = JoinSet::new();
        for model in &self.config.members {
            let gateway = Arc::clone(&self.gateway);
            let model = model.clone();
            let query = query.to_string();

            join_set.spawn(async move {
                let messages = [
                    ChatMessage::system(PromptTemplate::first_opinion_system()),
                    ChatMessage::user(query),
                ];
                let result = gateway.generate(&model, &messages, params).await;
                (model, result)
            });
        }

        let mut answers = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((model, Ok(content))) => {
                    info!(%model, "model responded");
                    let answer = ModelAnswer::success(model, content);
                    let _ = events.send(CouncilEvent::ModelResponse {
                        answer: answer.clone(),
                    });
                    answers.push(answer);
                }
                Ok((model, Err(e))) => {
                    warn!(%model, "model failed: {e}");
                    let _ = events.send(CouncilEvent::Error {
                        model: Some(model.clone()),
                        message: e.to_string(),
                        fatal: false,
                    });
                    answers.push(ModelAnswer::failure(model, e.to_string()));
                }
                Err(e) => {
                    warn!("first-opinion task join error: {e}");
                }
            }
        }

        answers
    }

    /// Stage 2: every valid responder ranks the others, anonymized.
    ///
    /// Reviews run concurrently over immutable inputs; a reviewer whose
    /// reply fails the strict schema is dropped with a warning.
    async fn stage_review(
        &self,
        query: &str,
        valid: &[ModelAnswer],
        events: &EventSender,
    ) -> Vec<PeerRanking> {
        let _ = events.send(CouncilEvent::StageUpdate {
            stage: Stage::Review,
            message: "Council members reviewing each other's responses...".to_string(),
        });

        // Reviews are judgement calls: keep them cool and bounded
        let params = GenerationParams::default()
            .with_temperature(0.3)
            .with_max_tokens(2000);

        let mut join_set = JoinSet::new();
        for answer in valid {
            let panel = AnonymizedPanel::for_reviewer(&answer.model, valid);
            if panel.is_empty() {
                continue;
            }

            let gateway = Arc::clone(&self.gateway);
            let reviewer = answer.model.clone();
            let prompt = PromptTemplate::review_prompt(query, &panel);

            join_set.spawn(async move {
                let messages = [
                    ChatMessage::system(PromptTemplate::review_system()),
                    ChatMessage::user(prompt),
                ];
                let reply = gateway.generate(&reviewer, &messages, params).await;
                let ranking = match reply {
                    Ok(reply) => parse_review_reply(&reviewer, &reply, &panel),
                    Err(e) => {
                        warn!(%reviewer, "review call failed: {e}");
                        None
                    }
                };
                (reviewer, ranking)
            });
        }

        let mut rankings = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((reviewer, Some(ranking))) => {
                    info!(%reviewer, "review accepted");
                    let _ = events.send(CouncilEvent::Review {
                        ranking: ranking.clone(),
                    });
                    rankings.push(ranking);
                }
                Ok((reviewer, None)) => {
                    warn!(%reviewer, "review dropped (failed or unparsable)");
                }
                Err(e) => {
                    warn!("review task join error: {e}");
                }
            }
        }

        rankings
    }

    /// Stage 3: the chairman synthesizes the final answer, streamed.
    async fn stage_final_response(
        &self,
        query: &str,
        valid: &[ModelAnswer],
        rankings: &[PeerRanking],
        events: &EventSender,
    ) -> Result<String, GatewayError> {
        let chairman = &self.config.chairman;
        let _ = events.send(CouncilEvent::StageUpdate {
            stage: Stage::FinalResponse,
            message: format!("Chairman ({chairman}) compiling final response..."),
        });

        let answer_refs: Vec<&ModelAnswer> = valid.iter().collect();
        let messages = [
            ChatMessage::system(PromptTemplate::synthesis_system()),
            ChatMessage::user(PromptTemplate::synthesis_prompt(
                query,
                &answer_refs,
                rankings,
            )),
        ];
        let params = GenerationParams::default()
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let mut handle = self
            .gateway
            .stream_generate(chairman, &messages, params)
            .await?;

        let mut assembled = String::new();
        while let Some(event) = handle.receiver.recv().await {
            match event {
                StreamEvent::Delta(fragment) => {
                    let _ = events.send(CouncilEvent::FinalResponse {
                        content: fragment.clone(),
                    });
                    assembled.push_str(&fragment);
                }
                StreamEvent::Completed(text) => {
                    if assembled.is_empty() {
                        // Non-streaming gateway: single full fragment
                        let _ = events.send(CouncilEvent::FinalResponse {
                            content: text.clone(),
                        });
                        assembled = text;
                    }
                    break;
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::MalformedResponse(e));
                }
            }
        }

        Ok(assembled)
    }
}
