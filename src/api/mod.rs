//! Public API layer: entry points for embedding the playground.
//!
//! [`Playground`] wires the message channel, console, relay listener and run
//! controller together.

mod playground;

pub use playground::Playground;
