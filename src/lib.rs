// Library surface for headless/integration tests and reuse.
// Rendering and terminal handling stay in the binary.
pub mod app_dirs;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod logging;
pub mod runtime;
pub mod scorer;
pub mod session;
pub mod theme;
pub mod timer;
pub mod wpm;

pub use session::{FinishReason, Phase, Session, SessionConfig};
