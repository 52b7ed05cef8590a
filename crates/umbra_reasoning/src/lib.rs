pub mod extraction;
pub mod generator;
pub mod prompts;

pub use extraction::{parse_thought, strip_json_fence};
pub use generator::ChatGenerator;
pub use prompts::{PersonaPrompt, NO_MEMORIES_LINE};
