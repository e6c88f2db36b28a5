//! Input boundary: logical actions and pointer position.
//!
//! # Invariants
//! - Consumers query actions, never raw key codes.
//! - No dependency on a windowing library.

pub mod action;

pub use action::{Action, ActionState, InputState, KeyBindings};
