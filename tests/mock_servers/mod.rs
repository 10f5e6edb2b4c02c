//! Mock servers standing in for the external HTTP collaborators.

pub mod mjs;
