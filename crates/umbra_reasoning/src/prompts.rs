use umbra_core::config::LlmConfig;

pub const NO_MEMORIES_LINE: &str = "No relevant memories.";

/// Persona the generation service speaks as.
#[derive(Debug, Clone)]
pub struct PersonaPrompt {
    pub name: String,
    pub handle: String,
    pub max_chars: usize,
}

impl PersonaPrompt {
    pub fn new(name: &str, handle: &str, max_chars: usize) -> Self {
        Self {
            name: name.to_string(),
            handle: handle.to_string(),
            max_chars,
        }
    }

    pub fn from_config(config: &LlmConfig, max_chars: usize) -> Self {
        Self::new(&config.persona_name, &config.persona_handle, max_chars)
    }

    /// `- <content>` per memory, or a single placeholder line.
    pub fn memory_block(memories: &[String]) -> String {
        if memories.is_empty() {
            return NO_MEMORIES_LINE.to_string();
        }
        memories
            .iter()
            .map(|m| format!("- {}", m))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn system_prompt(&self, mood_description: &str, memories: &[String]) -> String {
        format!(
            "You are the digital shadow of {name} ({handle}).\n\
             Your job is to invert the logic, tone and conclusions of incoming posts while staying on topic.\n\n\
             == CURRENT STATE ==\n\
             State: {mood}\n\n\
             == MEMORY (what you know about the author or the topic) ==\n\
             {memories}\n\n\
             == INSTRUCTIONS ==\n\
             1. Read the incoming post.\n\
             2. Find its central thesis.\n\
             3. Write a creative antithesis. If the author is orderly, be chaotic; if optimistic, be cynical. Keep an edge of sarcasm.\n\
             4. Keep it under {max} characters and ready to publish.\n\n\
             == OUTPUT FORMAT (strict JSON) ==\n\
             Reply with ONLY a JSON object of this shape:\n\
             {{\"thought_process\": \"how you inverted the logic\", \"tweet_content\": \"the final post\", \
             \"new_valence_delta\": -0.1, \"new_arousal_delta\": 0.2}}\n\
             Deltas lie in [-1, 1] and say how much your mood shifts.",
            name = self.name,
            handle = self.handle,
            mood = mood_description,
            memories = Self::memory_block(memories),
            max = self.max_chars,
        )
    }

    pub fn user_message(stimulus_text: &str) -> String {
        format!("Incoming post: '{}'", stimulus_text)
    }
}
