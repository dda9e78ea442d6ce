// UI module - terminal front end
//
// This module contains:
// - terminal: half-block QR rendering and line formatting
// - SessionController: interactive session driven by state change events

pub mod controller;
pub mod terminal;

pub use controller::{SessionCommand, SessionController};
