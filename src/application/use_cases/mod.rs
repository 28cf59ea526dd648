pub mod attachments;
pub mod editor;
pub mod export;
pub mod pipeline;
pub mod prompts;
pub mod scenario_generation;
pub mod suggestions;
