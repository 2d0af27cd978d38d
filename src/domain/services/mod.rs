pub mod actions;
pub mod attachments;
pub mod engine;
pub mod model_hint;
pub mod prompt_builder;
pub mod repl_state;
pub mod saved_prompts;
