//! Clock and frame-geometry invariants at the machine level.

use fami_core::Tickable;
use fami_nes::ppu::{DOTS_PER_LINE, LINES_PER_FRAME};
use fami_nes::{Nes, NesConfig, STEPS_PER_FRAME};

fn nop_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 16 + 0x8000 + 0x2000];
    rom[0..4].copy_from_slice(b"NES\x1a");
    rom[4] = 2;
    rom[5] = 1;
    for byte in &mut rom[16..16 + 0x8000] {
        *byte = 0xEA;
    }
    rom[16 + 0x7FFC] = 0x00;
    rom[16 + 0x7FFD] = 0x80;
    rom
}

fn make_nes() -> Nes {
    Nes::new(&NesConfig {
        rom_data: nop_rom(),
    })
    .expect("ROM should parse")
}

#[test]
fn steps_per_frame_matches_geometry() {
    assert_eq!(
        STEPS_PER_FRAME,
        u32::from(DOTS_PER_LINE) * u32::from(LINES_PER_FRAME)
    );
}

#[test]
fn consecutive_frames_are_exactly_one_frame_apart() {
    let mut nes = make_nes();
    nes.run_frame();
    let mut previous = nes.master_steps();
    for _ in 0..3 {
        nes.run_frame();
        let now = nes.master_steps();
        assert_eq!(now - previous, u64::from(STEPS_PER_FRAME));
        previous = now;
    }
}

#[test]
fn cpu_to_master_ratio_is_one_to_three() {
    let mut nes = make_nes();
    for window in [30u64, 300, 3000, u64::from(STEPS_PER_FRAME)] {
        let cpu_before = nes.cpu().total_cycles() as i64;
        let steps_before = nes.master_steps();
        while nes.master_steps() - steps_before < window {
            nes.tick();
        }
        let cpu_ticks = nes.cpu().total_cycles() as i64 - cpu_before;
        let expected = (window / 3) as i64;
        assert!(
            (cpu_ticks - expected).abs() <= 1,
            "window {window}: {cpu_ticks} CPU ticks, expected ~{expected}"
        );
    }
}

#[test]
fn beam_counters_stay_in_range() {
    let mut nes = make_nes();
    for _ in 0..(STEPS_PER_FRAME + 500) {
        nes.tick();
        assert!(nes.bus().ppu.scanline() < LINES_PER_FRAME);
        assert!(nes.bus().ppu.cycle() < DOTS_PER_LINE);
    }
}

#[test]
fn reset_restores_frame_phase() {
    let mut nes = make_nes();
    nes.run_frame();
    nes.reset();
    assert_eq!(nes.master_steps(), 0);
    assert_eq!(nes.frame_count(), 0);
    assert_eq!(nes.cpu().regs.pc, 0x8000);
    nes.run_frame();
    // The VBlank dot has 0-based index 241*341+1; a dot fires one master
    // step after its index elapses, plus the PPU's one-step phase offset
    assert_eq!(
        nes.master_steps(),
        u64::from(241 * u32::from(DOTS_PER_LINE) + 1 + 2)
    );
}
