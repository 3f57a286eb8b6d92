//! Event classification: turns the raw hook stream into semantic events,
//! maintaining the transient modifier state needed to tell standalone key
//! presses apart from combinations.

pub mod classifier;
pub mod keymap;
pub mod module;
