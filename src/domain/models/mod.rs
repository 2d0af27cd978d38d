mod action;
mod attachment;
mod backend;
mod chat;
mod error;
mod event;
mod host;
mod ids;
mod message;
mod project;
mod role;
mod saved_prompt;
mod slash_commands;
mod store;
mod turn;

pub use action::*;
pub use attachment::*;
pub use backend::*;
pub use chat::*;
pub use error::*;
pub use event::*;
pub use host::*;
pub use ids::*;
pub use message::*;
pub use project::*;
pub use role::*;
pub use saved_prompt::*;
pub use slash_commands::*;
pub use store::*;
pub use turn::*;
