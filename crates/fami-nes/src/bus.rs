//! The machine's two buses.
//!
//! CPU memory map:
//! - `$0000-$07FF`: 2 KiB work RAM, mirrored to `$1FFF`
//! - `$2000-$2007`: PPU register ports, mirrored every 8 bytes to `$3FFF`
//! - `$4000-$4015`: APU register stub
//! - `$4016-$4017`: controller ports
//! - `$4018-$401F`: disabled I/O
//! - `$8000-$FFFF`: cartridge PRG ROM
//!
//! PPU memory map:
//! - `$0000-$1FFF`: pattern tables (CHR ROM)
//! - `$2000-$2FFF`: nametable RAM, mirrored through `$3EFF`
//! - `$3F00-$3F1F`: palette RAM, mirrored to `$3FFF`
//!
//! Both buses decode through an [`AddressMap`]: the region with the
//! highest base at or below the address answers, and the device applies
//! its own mirroring.

use fami_core::{AddressMap, Bus, BusDevice, Ram, Region, Rom};
use tracing::trace;

use crate::apu::ApuStub;
use crate::controller::Controller;
use crate::palette::PaletteRam;
use crate::ppu::Ppu;

/// The two controller ports at `$4016`/`$4017`.
#[derive(Debug, Clone, Default)]
pub struct InputPorts {
    pub port1: Controller,
    pub port2: Controller,
}

impl BusDevice for InputPorts {
    fn region(&self) -> Region {
        Region::new(0x4016, 0x4017)
    }

    fn read(&mut self, addr: u16) -> u8 {
        if self.region().offset(addr) == 0 {
            self.port1.read()
        } else {
            self.port2.read()
        }
    }

    fn write(&mut self, _addr: u16, _value: u8) {
        self.port1.strobe();
        self.port2.strobe();
    }
}

/// The normally-disabled I/O block at `$4018-$401F`. Reads 0, drops
/// writes. Also answers for the open cartridge expansion space above it,
/// since nothing else claims `$4020-$7FFF`.
#[derive(Debug, Clone)]
struct DisabledIo {
    region: Region,
}

impl DisabledIo {
    fn new() -> Self {
        Self {
            region: Region::new(0x4018, 0x401F),
        }
    }
}

impl BusDevice for DisabledIo {
    fn region(&self) -> Region {
        self.region
    }

    fn read(&mut self, _addr: u16) -> u8 {
        0x00
    }

    fn write(&mut self, _addr: u16, _value: u8) {}
}

#[derive(Debug, Clone, Copy)]
enum CpuSlot {
    Ram,
    Ppu,
    Apu,
    Input,
    Disabled,
    Prg,
}

/// The CPU-side bus: work RAM, PPU ports, APU stub, controllers, PRG ROM.
pub struct CpuBus {
    map: AddressMap<CpuSlot>,
    ram: Ram,
    pub ppu: Ppu,
    apu: ApuStub,
    pub input: InputPorts,
    io: DisabledIo,
    prg: Rom,
}

impl CpuBus {
    #[must_use]
    pub fn new() -> Self {
        let ram = Ram::new(Region::mirrored(0x0000, 0x07FF, 0x1FFF));
        let ppu = Ppu::new();
        let apu = ApuStub::new();
        let input = InputPorts::default();
        let io = DisabledIo::new();
        let prg = Rom::new(Region::new(0x8000, 0xFFFF));

        let mut map = AddressMap::new();
        map.insert(ram.region(), CpuSlot::Ram);
        map.insert(ppu.region(), CpuSlot::Ppu);
        map.insert(apu.region(), CpuSlot::Apu);
        map.insert(input.region(), CpuSlot::Input);
        map.insert(io.region(), CpuSlot::Disabled);
        map.insert(prg.region(), CpuSlot::Prg);

        Self {
            map,
            ram,
            ppu,
            apu,
            input,
            io,
            prg,
        }
    }

    /// Load a PRG image into the ROM window and refresh the decode order.
    pub fn load_prg(&mut self, data: &[u8]) {
        self.prg.load(data);
        self.reset();
    }

    /// Re-sort the address decode.
    pub fn reset(&mut self) {
        self.map.reset();
    }

    /// Read RAM without side effects (for observation).
    #[must_use]
    pub fn peek_ram(&self, addr: u16) -> u8 {
        self.ram.peek(addr)
    }
}

impl Default for CpuBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for CpuBus {
    fn read(&mut self, address: u16) -> u8 {
        match self.map.resolve(address) {
            Some(CpuSlot::Ram) => self.ram.read(address),
            Some(CpuSlot::Ppu) => self.ppu.read(address),
            Some(CpuSlot::Apu) => self.apu.read(address),
            Some(CpuSlot::Input) => self.input.read(address),
            Some(CpuSlot::Disabled) => self.io.read(address),
            Some(CpuSlot::Prg) => self.prg.read(address),
            None => {
                trace!("unmapped bus read at ${address:04X}");
                0x00
            }
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match self.map.resolve(address) {
            Some(CpuSlot::Ram) => self.ram.write(address, value),
            Some(CpuSlot::Ppu) => self.ppu.write(address, value),
            Some(CpuSlot::Apu) => self.apu.write(address, value),
            Some(CpuSlot::Input) => self.input.write(address, value),
            Some(CpuSlot::Disabled) => self.io.write(address, value),
            Some(CpuSlot::Prg) => self.prg.write(address, value),
            None => trace!("unmapped bus write at ${address:04X}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PpuSlot {
    Pattern,
    Nametable,
    Palette,
}

/// The PPU-side bus: pattern tables, nametable RAM, palette RAM.
pub struct PpuBus {
    map: AddressMap<PpuSlot>,
    pattern: Rom,
    nametable: Ram,
    palette: PaletteRam,
}

impl PpuBus {
    #[must_use]
    pub fn new() -> Self {
        let pattern = Rom::new(Region::new(0x0000, 0x1FFF));
        let nametable = Ram::new(Region::mirrored(0x2000, 0x2FFF, 0x3EFF));
        let palette = PaletteRam::new();

        let mut map = AddressMap::new();
        map.insert(pattern.region(), PpuSlot::Pattern);
        map.insert(nametable.region(), PpuSlot::Nametable);
        map.insert(palette.region(), PpuSlot::Palette);

        Self {
            map,
            pattern,
            nametable,
            palette,
        }
    }

    /// Load a CHR image into the pattern tables and refresh the decode.
    pub fn load_chr(&mut self, data: &[u8]) {
        self.pattern.load(data);
        self.map.reset();
    }

    /// Re-sort the decode and clear the RAM regions.
    pub fn reset(&mut self) {
        self.map.reset();
        self.nametable.clear();
        self.palette.clear();
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        match self.map.resolve(addr) {
            Some(PpuSlot::Pattern) => self.pattern.read(addr),
            Some(PpuSlot::Nametable) => self.nametable.read(addr),
            Some(PpuSlot::Palette) => self.palette.read(addr),
            None => {
                trace!("unmapped PPU bus read at ${addr:04X}");
                0x00
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match self.map.resolve(addr) {
            Some(PpuSlot::Pattern) => self.pattern.write(addr, value),
            Some(PpuSlot::Nametable) => self.nametable.write(addr, value),
            Some(PpuSlot::Palette) => self.palette.write(addr, value),
            None => trace!("unmapped PPU bus write at ${addr:04X}"),
        }
    }
}

impl Default for PpuBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Button;

    #[test]
    fn ram_mirrors_through_1fff() {
        let mut bus = CpuBus::new();
        bus.write(0x0000, 0xAB);
        assert_eq!(bus.read(0x0000), 0xAB);
        assert_eq!(bus.read(0x0800), 0xAB);
        assert_eq!(bus.read(0x1000), 0xAB);
        assert_eq!(bus.read(0x1800), 0xAB);
    }

    #[test]
    fn prg_rom_is_write_protected() {
        let mut bus = CpuBus::new();
        bus.load_prg(&[0xEA; 0x8000]);
        bus.write(0x8000, 0x00);
        assert_eq!(bus.read(0x8000), 0xEA);
    }

    #[test]
    fn controller_port_wins_decode_over_apu() {
        let mut bus = CpuBus::new();
        bus.input.port1.set_button(Button::A, true);
        // $4015 is the APU; $4016 is the controller
        assert_eq!(bus.read(0x4015), 0);
        assert_eq!(bus.read(0x4016) & 1, 1);
    }

    #[test]
    fn disabled_io_reads_zero() {
        let mut bus = CpuBus::new();
        bus.write(0x4018, 0xFF);
        assert_eq!(bus.read(0x4018), 0);
        // Open cartridge expansion space decodes to the same block
        assert_eq!(bus.read(0x5000), 0);
        assert_eq!(bus.read(0x7FFF), 0);
    }

    #[test]
    fn ppu_ports_reachable_through_mirrors() {
        let mut bus = CpuBus::new();
        // PPUMASK via a deep mirror
        bus.write(0x3FF9, 0x1E);
        bus.write(0x2001, 0x00);
        // The second write cleared it again; just prove routing hit the PPU
        // by setting PPUADDR/PPUDATA through mirrors and reading back
        bus.write(0x2006, 0x21);
        bus.write(0x2006, 0x00);
        bus.write(0x200F, 0x55); // $200F mirrors $2007 (PPUDATA)
        assert_eq!(bus.ppu.peek_vram(0x2100), 0x55);
    }

    #[test]
    fn ppu_bus_nametable_mirrors_to_3eff() {
        let mut bus = PpuBus::new();
        bus.write(0x2000, 0x42);
        assert_eq!(bus.read(0x3000), 0x42);
        bus.write(0x3EFF, 0x24);
        assert_eq!(bus.read(0x2EFF), 0x24);
    }

    #[test]
    fn chr_loads_into_pattern_tables() {
        let mut bus = PpuBus::new();
        let mut chr = vec![0u8; 0x2000];
        chr[0x0010] = 0xAA;
        bus.load_chr(&chr);
        assert_eq!(bus.read(0x0010), 0xAA);
        // CHR is ROM: writes drop
        bus.write(0x0010, 0x00);
        assert_eq!(bus.read(0x0010), 0xAA);
    }
}
