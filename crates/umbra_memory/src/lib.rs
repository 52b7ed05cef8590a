pub mod sqlite;
pub mod embedding;
pub mod semantic;

pub use sqlite::SqliteStore;
pub use embedding::{build_embedder, cosine_distance, cosine_similarity, OpenAiEmbedder};
#[cfg(feature = "local-embeddings")]
pub use embedding::LocalEmbedder;
pub use semantic::SemanticMemory;
