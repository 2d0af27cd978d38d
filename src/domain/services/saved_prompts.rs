#[cfg(test)]
#[path = "saved_prompts_test.rs"]
mod tests;

use crate::domain::models::EngineError;
use crate::domain::models::SavedPrompt;
use crate::infrastructure::stores::read_collection;
use crate::infrastructure::stores::write_collection;
use crate::infrastructure::stores::KeyValueBox;

pub const SAVED_PROMPTS_KEY: &str = "chatdesk.savedPrompts";

/// Reusable input snippets. They always live in the local key-value
/// substrate, whichever chat store is active.
pub struct SavedPromptsService {
    kv: KeyValueBox,
}

impl SavedPromptsService {
    pub fn new(kv: KeyValueBox) -> SavedPromptsService {
        return SavedPromptsService { kv };
    }

    pub fn list(&self) -> Vec<SavedPrompt> {
        return read_collection::<SavedPrompt>(&self.kv, SAVED_PROMPTS_KEY);
    }

    /// Inserts the prompt, or replaces the one with the same id.
    pub fn save(&self, prompt: SavedPrompt) -> Result<(), EngineError> {
        if prompt.name.trim().is_empty() || prompt.text.trim().is_empty() {
            return Err(EngineError::validation(
                "A saved prompt needs both a name and some text",
            ));
        }

        let mut prompts = self.list();
        match prompts.iter_mut().find(|e| return e.id == prompt.id) {
            Some(existing) => *existing = prompt,
            None => prompts.push(prompt),
        }
        write_collection(&self.kv, SAVED_PROMPTS_KEY, &prompts)?;

        return Ok(());
    }

    pub fn delete(&self, id: &str) -> Result<(), EngineError> {
        let mut prompts = self.list();
        let before = prompts.len();
        prompts.retain(|e| return e.id != id);
        if prompts.len() == before {
            return Err(EngineError::not_found(&format!("Saved prompt {id}")));
        }
        write_collection(&self.kv, SAVED_PROMPTS_KEY, &prompts)?;

        return Ok(());
    }
}
