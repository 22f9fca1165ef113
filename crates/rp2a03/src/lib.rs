//! Ricoh 2A03 CPU core: the NES's NMOS 6502 without decimal mode.
//!
//! Instructions execute in one burst at their leading edge and then idle
//! out their documented cycle count, one cycle per `tick()`. This keeps
//! instruction timing exact as seen from the bus without modelling each
//! intra-instruction bus access.

mod cpu;
pub mod flags;
mod opcodes;
mod registers;

pub use cpu::{Rp2a03, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
pub use flags::Status;
pub use registers::Registers;
