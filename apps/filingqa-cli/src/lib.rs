pub mod interaction;
pub mod wrap;

pub use interaction::{InteractionLoop, Outcome, EXAMPLE_QUESTIONS};
