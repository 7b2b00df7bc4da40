//! Prompt construction for every LLM call the system makes.

pub mod template;

pub use template::PromptTemplate;
