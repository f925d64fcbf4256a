//! Control-flow primitives shared by the GitHub client.

mod state;

pub use state::*;
