//! The running terminal: one task owns the [`Simulator`] and serializes
//! scheduled ticks with user commands.

pub mod controller;
pub mod simulator;

pub use controller::{TerminalCommand, TerminalController, TerminalHandle, TerminalTask};
pub use simulator::{PlaceOrder, Simulator};
