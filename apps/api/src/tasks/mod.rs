pub mod handlers;
pub mod producers;
mod prompts;
pub mod queue;
pub mod watch;
pub mod worker;
