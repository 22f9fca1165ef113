//! Cycle-driven NES/Famicom emulator.
//!
//! The master clock steps at the PPU dot rate: the PPU is wired at divider
//! 1 and the CPU at divider 3, so three dots pass per CPU cycle and one
//! NTSC frame is 341 × 262 = 89,342 master steps.
//!
//! Two buses bind the machine together. The CPU bus routes to work RAM,
//! the PPU register ports, the APU stub, the controller ports, and PRG
//! ROM; the PPU's own bus routes to CHR pattern ROM, nametable RAM, and
//! palette RAM. The PPU raises an NMI line at the start of vertical blank,
//! which the system latches into the CPU at its next instruction boundary.

mod apu;
mod bus;
pub mod capture;
mod cartridge;
mod config;
mod controller;
mod error;
mod nes;
pub mod palette;
pub mod ppu;

pub use bus::CpuBus;
pub use cartridge::{Cartridge, Mirroring, TvSystem};
pub use config::NesConfig;
pub use controller::{Button, Controller};
pub use error::Error;
pub use nes::{Nes, VideoSink, STEPS_PER_FRAME};
pub use ppu::Ppu;
