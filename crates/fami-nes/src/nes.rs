//! Top-level NES system.
//!
//! The master clock steps at the PPU dot rate. The CPU is registered
//! first at divider 3, the PPU after it at divider 1 with a one-step
//! phase offset, so within a step the CPU's effect on PPU registers is
//! visible to the dots that follow it.

use std::path::Path;
use std::thread;

use fami_core::{Clock, SlotId, Tickable};
use rp2a03::Rp2a03;

use crate::bus::CpuBus;
use crate::cartridge::Cartridge;
use crate::config::NesConfig;
use crate::controller::Button;
use crate::error::Error;
use crate::ppu::{DOTS_PER_LINE, LINES_PER_FRAME};

/// Master steps per NTSC frame.
pub const STEPS_PER_FRAME: u32 = DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32;

const CPU_DIVIDER: u32 = 3;
const PPU_DIVIDER: u32 = 1;

/// One-time phase offset of the PPU slot behind the CPU slot.
const CLOCK_OFFSET: u32 = 1;

/// Host pacing between cooperative batches, roughly one 60 Hz frame.
const YIELD_DELAY: std::time::Duration = std::time::Duration::from_millis(16);

/// Receives finished frames during [`Nes::start`].
pub trait VideoSink {
    /// Present a 256×240 RGBA8 frame. Return `false` to stop the run loop.
    fn present(&mut self, frame: &[u8]) -> bool;
}

/// The Nintendo Entertainment System.
pub struct Nes {
    clock: Clock,
    cpu: Rp2a03,
    bus: CpuBus,
    cpu_slot: SlotId,
    ppu_slot: SlotId,
    running: bool,
    frame_count: u64,
}

impl Nes {
    /// Build a machine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns a cartridge-loading error if the ROM image is rejected.
    pub fn new(config: &NesConfig) -> Result<Self, Error> {
        let cartridge = Cartridge::parse(&config.rom_data)?;
        let mut bus = CpuBus::new();
        cartridge.install(&mut bus);

        let mut clock = Clock::with_batching(STEPS_PER_FRAME, YIELD_DELAY);
        let cpu_slot = clock.register(CPU_DIVIDER, 0);
        let ppu_slot = clock.register(PPU_DIVIDER, CLOCK_OFFSET);

        let mut cpu = Rp2a03::new();
        cpu.reset(&mut bus);

        Ok(Self {
            clock,
            cpu,
            bus,
            cpu_slot,
            ppu_slot,
            running: false,
            frame_count: 0,
        })
    }

    /// Build a machine from an iNES file on disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for unreadable files, or a cartridge-loading
    /// error for rejected images.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let rom_data = std::fs::read(path)?;
        Self::new(&NesConfig { rom_data })
    }

    /// Reset the machine: CPU to the reset vector, PPU registers and beam
    /// position cleared, both buses re-sorted, clock phases restored.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.bus.ppu.reset();
        self.cpu.reset(&mut self.bus);
        self.clock.reset();
        self.frame_count = 0;
    }

    /// Run until stopped: batches of clock steps with a host yield between
    /// them, presenting each finished frame to the sink.
    pub fn start(&mut self, reset: bool, sink: &mut dyn VideoSink) {
        if reset {
            self.reset();
        }
        self.running = true;
        while self.running {
            for _ in 0..self.clock.yield_interval() {
                self.tick();
                if self.bus.ppu.take_frame() {
                    self.frame_count += 1;
                    if !sink.present(self.bus.ppu.framebuffer()) {
                        self.running = false;
                        break;
                    }
                }
            }
            if self.running {
                thread::sleep(self.clock.yield_delay());
            }
        }
    }

    /// Request the run loop to stop at the next batch boundary.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Step the master clock until the next frame boundary.
    pub fn run_frame(&mut self) {
        loop {
            self.tick();
            if self.bus.ppu.take_frame() {
                self.frame_count += 1;
                return;
            }
        }
    }

    /// The 256×240 RGBA8 framebuffer.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.framebuffer()
    }

    /// Completed frames.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Master clock steps executed.
    #[must_use]
    pub fn master_steps(&self) -> u64 {
        self.clock.steps()
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Rp2a03 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Rp2a03 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &CpuBus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut CpuBus {
        &mut self.bus
    }

    /// Press a button on controller 1.
    pub fn press_button(&mut self, button: Button) {
        self.bus.input.port1.set_button(button, true);
    }

    /// Release a button on controller 1.
    pub fn release_button(&mut self, button: Button) {
        self.bus.input.port1.set_button(button, false);
    }
}

impl Tickable for Nes {
    /// One master step: fire due clock slots in registration order, then
    /// sample the PPU's NMI line into the CPU.
    fn tick(&mut self) {
        let fired = self.clock.step();
        if fired.contains(self.cpu_slot) {
            self.cpu.tick(&mut self.bus);
        }
        if fired.contains(self.ppu_slot) {
            self.bus.ppu.tick();
            if self.bus.ppu.take_nmi() {
                self.cpu.generate_nmi();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{CHR_BANK_SIZE, HEADER_LEN, PRG_BANK_SIZE};

    fn nop_rom() -> Vec<u8> {
        // 32K PRG of NOPs, reset vector at $8000
        let prg_len = 2 * PRG_BANK_SIZE;
        let mut data = vec![0u8; HEADER_LEN + prg_len + CHR_BANK_SIZE];
        data[0..4].copy_from_slice(b"NES\x1a");
        data[4] = 2;
        data[5] = 1;
        for byte in &mut data[HEADER_LEN..HEADER_LEN + prg_len] {
            *byte = 0xEA;
        }
        data[HEADER_LEN + 0x7FFC] = 0x00;
        data[HEADER_LEN + 0x7FFD] = 0x80;
        data
    }

    fn make_nes() -> Nes {
        Nes::new(&NesConfig {
            rom_data: nop_rom(),
        })
        .expect("ROM should parse")
    }

    #[test]
    fn reset_vector_honored() {
        let nes = make_nes();
        assert_eq!(nes.cpu().regs.pc, 0x8000);
        assert_eq!(nes.cpu().regs.s, 0xFD);
        assert_eq!(nes.cpu().regs.p.0, 0x34);
    }

    #[test]
    fn frame_boundary_spacing_is_exact() {
        let mut nes = make_nes();
        nes.run_frame();
        let first = nes.master_steps();
        nes.run_frame();
        assert_eq!(nes.master_steps() - first, u64::from(STEPS_PER_FRAME));
        assert_eq!(nes.frame_count(), 2);
    }

    #[test]
    fn cpu_runs_at_a_third_of_the_master_rate() {
        let mut nes = make_nes();
        for _ in 0..3000 {
            nes.tick();
        }
        let cpu_cycles = nes.cpu().total_cycles() as i64;
        assert!((cpu_cycles - 1000).abs() <= 1);
    }

    #[test]
    fn stop_flag_halts_start() {
        struct OneFrame;
        impl VideoSink for OneFrame {
            fn present(&mut self, _frame: &[u8]) -> bool {
                false
            }
        }
        let mut nes = make_nes();
        nes.start(false, &mut OneFrame);
        assert_eq!(nes.frame_count(), 1);
    }
}
