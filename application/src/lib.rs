//! Application layer for llm-council
//!
//! This crate defines the ports the core consumes (LLM gateway, embedding
//! provider, chunk and conflict repositories) and the use cases that drive
//! them: running a council deliberation, building retrieval-augmented
//! context, detecting conflicts, and ingesting documents.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConflictConfig, CouncilConfig, EmbeddingConfig, RagConfig};
pub use ports::chunk_store::{
    ChunkRepository, ChunkStoreError, DocumentRecord, RetrievedChunk, SourceRecord, StoredChunk,
};
pub use ports::conflict_store::ConflictRepository;
pub use ports::embedding::{EmbeddingEngine, EmbeddingError, EmbeddingProvider};
pub use ports::llm_gateway::{
    ChatMessage, GatewayError, GenerationParams, LlmGateway, Role, StreamEvent, StreamHandle,
};
pub use use_cases::build_context::{ContextError, RagContext, RagContextBuilder};
pub use use_cases::detect_conflicts::ConflictDetector;
pub use use_cases::ingest_document::{DocumentIngest, IngestDocumentUseCase, IngestReport};
pub use use_cases::run_council::{RunCouncilError, RunCouncilInput, RunCouncilUseCase};
