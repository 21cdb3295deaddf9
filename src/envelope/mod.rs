// The envelope protocol: outcome shape, retry state, hooks, and the engine
// that orchestrates encode -> send -> decode for every call

pub mod engine;
pub mod hooks;
pub mod outcome;
pub mod retry;
