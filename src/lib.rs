// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod score;
pub mod sequencer;
pub mod session;
pub mod timer;
pub mod util;

pub use error::{FlinchError, Result};
pub use score::Report;
pub use sequencer::{Sequencer, Signal};
pub use session::{RoundState, SessionConfig};
