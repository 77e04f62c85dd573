pub mod ai;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{CompletionBackend, GeminiClient};
pub use config::{ClientSettings, Config};
pub use error::{ChatError, CompletionError, ConfigError};
pub use session::{ChatSession, PendingReply};
pub use state::{Message, Reply, Role, SessionState, Transcript};
