// Thin driver around the engine: terminal summary and the refresh loop.

pub mod refresh;
pub mod summary;

pub use refresh::{run_refresh_loop, RefreshOptions, RefreshPrompt, StdinPrompt};
pub use summary::render_run;
