//! 2A03 execution core.

use fami_core::Bus;
use tracing::warn;

use crate::flags::{self, Status};
use crate::opcodes::{AddrMode, Mnemonic, OpEntry, OPCODES};
use crate::Registers;

/// Reset vector.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// NMI vector.
pub const NMI_VECTOR: u16 = 0xFFFA;

/// IRQ/BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles charged for servicing a hardware interrupt.
const INTERRUPT_CYCLES: u32 = 7;

/// Resolved operand of an instruction.
enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    Address(u16),
}

/// The Ricoh 2A03 CPU.
///
/// `tick()` advances one CPU cycle. An instruction executes entirely on the
/// tick its cycle counter reaches zero, then the charged count (base cycles
/// plus any page-cross or branch extras) drains one cycle per tick before
/// the next fetch.
#[derive(Debug)]
pub struct Rp2a03 {
    /// Register file.
    pub regs: Registers,
    cycles_remaining: u32,
    additional_cycles: u32,
    pending_irq: bool,
    pending_nmi: bool,
    total_cycles: u64,
}

impl Rp2a03 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            cycles_remaining: 0,
            additional_cycles: 0,
            pending_irq: false,
            pending_nmi: false,
            total_cycles: 0,
        }
    }

    /// Reset: registers to power-on state, PC from the reset vector.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        let lo = bus.read(RESET_VECTOR);
        let hi = bus.read(RESET_VECTOR.wrapping_add(1));
        self.regs = Registers::new();
        self.regs.pc = u16::from(lo) | u16::from(hi) << 8;
        self.cycles_remaining = 0;
        self.additional_cycles = 0;
        self.pending_irq = false;
        self.pending_nmi = false;
    }

    /// One CPU cycle.
    pub fn tick<B: Bus>(&mut self, bus: &mut B) {
        if self.cycles_remaining == 0 {
            self.execute(bus);
        }
        self.cycles_remaining = self.cycles_remaining.saturating_sub(1);
        self.total_cycles += 1;
    }

    /// Latch a maskable interrupt request.
    pub fn generate_irq(&mut self) {
        self.pending_irq = true;
    }

    /// Latch a non-maskable interrupt request.
    pub fn generate_nmi(&mut self) {
        self.pending_nmi = true;
    }

    /// Whether the current instruction has drained its cycle count.
    #[must_use]
    pub fn instruction_complete(&self) -> bool {
        self.cycles_remaining == 0
    }

    /// Cycles executed since construction.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    fn execute<B: Bus>(&mut self, bus: &mut B) {
        self.additional_cycles = 0;

        if self.pending_irq && !self.regs.p.is_set(flags::I) {
            self.pending_irq = false;
            self.service_interrupt(bus, IRQ_VECTOR);
            return;
        }
        if self.pending_nmi {
            self.pending_nmi = false;
            self.service_interrupt(bus, NMI_VECTOR);
            return;
        }

        let at = self.regs.pc;
        let opcode = self.fetch(bus);
        let entry = OPCODES[opcode as usize];
        if matches!(entry.mnemonic, Mnemonic::Invalid) {
            // The fetch already stepped past the offending byte.
            warn!("invalid opcode ${opcode:02X} at ${at:04X}, skipping");
        } else {
            self.dispatch(bus, entry);
        }
        self.cycles_remaining = u32::from(entry.cycles) + self.additional_cycles;
    }

    /// Hardware interrupt entry. I is raised before P is stacked; RTI drops
    /// it on the way out.
    fn service_interrupt<B: Bus>(&mut self, bus: &mut B, vector: u16) {
        let pc = self.regs.pc;
        self.push(bus, (pc >> 8) as u8);
        self.push(bus, pc as u8);
        self.regs.p.set(flags::I);
        self.push(bus, self.regs.p.to_byte_irq());
        self.regs.pc = self.read_word(bus, vector);
        self.cycles_remaining = INTERRUPT_CYCLES;
    }

    fn dispatch<B: Bus>(&mut self, bus: &mut B, entry: OpEntry) {
        use Mnemonic::*;

        match entry.mnemonic {
            // Loads
            Lda => {
                let v = self.read_operand(bus, entry);
                self.regs.a = v;
                self.regs.p.update_nz(v);
            }
            Ldx => {
                let v = self.read_operand(bus, entry);
                self.regs.x = v;
                self.regs.p.update_nz(v);
            }
            Ldy => {
                let v = self.read_operand(bus, entry);
                self.regs.y = v;
                self.regs.p.update_nz(v);
            }

            // Stores
            Sta => {
                let addr = self.target(bus, entry.mode);
                bus.write(addr, self.regs.a);
            }
            Stx => {
                let addr = self.target(bus, entry.mode);
                bus.write(addr, self.regs.x);
            }
            Sty => {
                let addr = self.target(bus, entry.mode);
                bus.write(addr, self.regs.y);
            }

            // Arithmetic
            Adc => {
                let v = self.read_operand(bus, entry);
                self.adc(v);
            }
            Sbc => {
                let v = self.read_operand(bus, entry);
                self.sbc(v);
            }

            // Logic
            And => {
                let v = self.read_operand(bus, entry);
                self.regs.a &= v;
                self.regs.p.update_nz(self.regs.a);
            }
            Ora => {
                let v = self.read_operand(bus, entry);
                self.regs.a |= v;
                self.regs.p.update_nz(self.regs.a);
            }
            Eor => {
                let v = self.read_operand(bus, entry);
                self.regs.a ^= v;
                self.regs.p.update_nz(self.regs.a);
            }
            Bit => {
                let v = self.read_operand(bus, entry);
                self.regs.p.set_if(flags::Z, self.regs.a & v == 0);
                self.regs.p.set_if(flags::N, v & 0x80 != 0);
                self.regs.p.set_if(flags::V, v & 0x40 != 0);
            }

            // Compares
            Cmp => {
                let v = self.read_operand(bus, entry);
                self.compare(self.regs.a, v);
            }
            Cpx => {
                let v = self.read_operand(bus, entry);
                self.compare(self.regs.x, v);
            }
            Cpy => {
                let v = self.read_operand(bus, entry);
                self.compare(self.regs.y, v);
            }

            // Shifts and rotates
            Asl => self.rmw(bus, entry.mode, Self::do_asl),
            Lsr => self.rmw(bus, entry.mode, Self::do_lsr),
            Rol => self.rmw(bus, entry.mode, Self::do_rol),
            Ror => self.rmw(bus, entry.mode, Self::do_ror),

            // Increments and decrements
            Inc => self.rmw(bus, entry.mode, |cpu, v| {
                let r = v.wrapping_add(1);
                cpu.regs.p.update_nz(r);
                r
            }),
            Dec => self.rmw(bus, entry.mode, |cpu, v| {
                let r = v.wrapping_sub(1);
                cpu.regs.p.update_nz(r);
                r
            }),
            Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }

            // Branches
            Bcc => self.branch(bus, !self.regs.p.is_set(flags::C)),
            Bcs => self.branch(bus, self.regs.p.is_set(flags::C)),
            Beq => self.branch(bus, self.regs.p.is_set(flags::Z)),
            Bne => self.branch(bus, !self.regs.p.is_set(flags::Z)),
            Bmi => self.branch(bus, self.regs.p.is_set(flags::N)),
            Bpl => self.branch(bus, !self.regs.p.is_set(flags::N)),
            Bvs => self.branch(bus, self.regs.p.is_set(flags::V)),
            Bvc => self.branch(bus, !self.regs.p.is_set(flags::V)),

            // Flag operations
            Clc => self.regs.p.clear(flags::C),
            Sec => self.regs.p.set(flags::C),
            Cli => self.regs.p.clear(flags::I),
            Sei => self.regs.p.set(flags::I),
            Cld => self.regs.p.clear(flags::D),
            Sed => self.regs.p.set(flags::D),
            Clv => self.regs.p.clear(flags::V),

            // Transfers
            Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            Txs => self.regs.s = self.regs.x,
            Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }

            // Control flow
            Jmp => {
                let addr = self.target(bus, entry.mode);
                self.regs.pc = addr;
            }
            Jsr => {
                let addr = self.fetch_word(bus);
                let ret = self.regs.pc.wrapping_sub(1);
                self.push(bus, (ret >> 8) as u8);
                self.push(bus, ret as u8);
                self.regs.pc = addr;
            }
            Rts => {
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.regs.pc = (u16::from(lo) | u16::from(hi) << 8).wrapping_add(1);
            }
            Brk => {
                // The byte after BRK is padding; the stacked return address
                // skips it.
                self.regs.pc = self.regs.pc.wrapping_add(1);
                let pc = self.regs.pc;
                self.push(bus, (pc >> 8) as u8);
                self.push(bus, pc as u8);
                self.regs.p.set(flags::I);
                self.push(bus, self.regs.p.to_byte_brk());
                self.regs.pc = self.read_word(bus, IRQ_VECTOR);
            }
            Rti => {
                let p = self.pull(bus);
                self.regs.p = Status::from_byte(p);
                self.regs.p.clear(flags::I);
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.regs.pc = u16::from(lo) | u16::from(hi) << 8;
            }

            // Stack
            Pha => {
                let a = self.regs.a;
                self.push(bus, a);
            }
            Php => {
                let p = self.regs.p.to_byte_brk();
                self.push(bus, p);
            }
            Pla => {
                let v = self.pull(bus);
                self.regs.a = v;
                self.regs.p.update_nz(v);
            }
            Plp => {
                let p = self.pull(bus);
                self.regs.p = Status::from_byte(p);
            }

            Nop => {}
            Invalid => {}
        }
    }

    // === Addressing ===

    fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let v = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        v
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from(lo) | u16::from(hi) << 8
    }

    fn read_word<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        u16::from(lo) | u16::from(hi) << 8
    }

    /// Resolve the operand for the given mode, charging indexed page-cross
    /// penalties when the entry asks for them.
    fn operand<B: Bus>(&mut self, bus: &mut B, mode: AddrMode, page_penalty: bool) -> Operand {
        match mode {
            AddrMode::Imp | AddrMode::Rel => Operand::Implied,
            AddrMode::Acc => Operand::Accumulator,
            AddrMode::Imm => Operand::Immediate(self.fetch(bus)),
            AddrMode::Zp => Operand::Address(u16::from(self.fetch(bus))),
            AddrMode::ZpX => {
                let zp = self.fetch(bus).wrapping_add(self.regs.x);
                Operand::Address(u16::from(zp))
            }
            AddrMode::ZpY => {
                let zp = self.fetch(bus).wrapping_add(self.regs.y);
                Operand::Address(u16::from(zp))
            }
            AddrMode::Abs => Operand::Address(self.fetch_word(bus)),
            AddrMode::AbsX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.regs.x));
                if page_penalty && page_crossed(base, addr) {
                    self.additional_cycles += 1;
                }
                Operand::Address(addr)
            }
            AddrMode::AbsY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.regs.y));
                if page_penalty && page_crossed(base, addr) {
                    self.additional_cycles += 1;
                }
                Operand::Address(addr)
            }
            AddrMode::Ind => {
                let ptr = self.fetch_word(bus);
                Operand::Address(self.read_word_bugged(bus, ptr))
            }
            AddrMode::IndX => {
                let zp = self.fetch(bus).wrapping_add(self.regs.x);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                Operand::Address(u16::from(lo) | u16::from(hi) << 8)
            }
            AddrMode::IndY => {
                let zp = self.fetch(bus);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from(lo) | u16::from(hi) << 8;
                let addr = base.wrapping_add(u16::from(self.regs.y));
                if page_penalty && page_crossed(base, addr) {
                    self.additional_cycles += 1;
                }
                Operand::Address(addr)
            }
        }
    }

    /// The NMOS indirect-JMP bug: a pointer ending in $FF wraps its high
    /// byte read to the start of the same page.
    fn read_word_bugged<B: Bus>(&mut self, bus: &mut B, ptr: u16) -> u16 {
        let lo = bus.read(ptr);
        let hi_addr = if ptr & 0x00FF == 0x00FF {
            ptr & 0xFF00
        } else {
            ptr.wrapping_add(1)
        };
        let hi = bus.read(hi_addr);
        u16::from(lo) | u16::from(hi) << 8
    }

    fn read_operand<B: Bus>(&mut self, bus: &mut B, entry: OpEntry) -> u8 {
        match self.operand(bus, entry.mode, entry.page_penalty) {
            Operand::Immediate(v) => v,
            Operand::Address(addr) => bus.read(addr),
            Operand::Accumulator => self.regs.a,
            Operand::Implied => 0,
        }
    }

    fn target<B: Bus>(&mut self, bus: &mut B, mode: AddrMode) -> u16 {
        match self.operand(bus, mode, false) {
            Operand::Address(addr) => addr,
            _ => 0,
        }
    }

    /// Read-modify-write through memory or the accumulator.
    fn rmw<B: Bus>(&mut self, bus: &mut B, mode: AddrMode, f: fn(&mut Self, u8) -> u8) {
        match self.operand(bus, mode, false) {
            Operand::Accumulator => {
                let a = self.regs.a;
                let r = f(self, a);
                self.regs.a = r;
            }
            Operand::Address(addr) => {
                let v = bus.read(addr);
                let r = f(self, v);
                bus.write(addr, r);
            }
            _ => {}
        }
    }

    /// Shared branch body: +1 cycle taken, +1 more on a page crossing.
    fn branch<B: Bus>(&mut self, bus: &mut B, taken: bool) {
        let offset = self.fetch(bus) as i8;
        if !taken {
            return;
        }
        self.additional_cycles += 1;
        let target = self.regs.pc.wrapping_add(offset as i16 as u16);
        if page_crossed(self.regs.pc, target) {
            self.additional_cycles += 1;
        }
        self.regs.pc = target;
    }

    // === ALU ===

    fn adc(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let c = u16::from(self.regs.p.is_set(flags::C));
        let result = a + v + c;
        let result8 = result as u8;

        self.regs.p.set_if(flags::C, result > 0xFF);
        self.regs.p.set_if(
            flags::V,
            (!(self.regs.a ^ value) & (self.regs.a ^ result8)) & 0x80 != 0,
        );
        self.regs.p.update_nz(result8);
        self.regs.a = result8;
    }

    fn sbc(&mut self, value: u8) {
        // Binary subtraction is addition of the one's complement; the 2A03
        // has no decimal path.
        self.adc(!value);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(flags::C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    fn do_asl(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(flags::C, value & 0x80 != 0);
        let r = value << 1;
        self.regs.p.update_nz(r);
        r
    }

    fn do_lsr(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(flags::C, value & 0x01 != 0);
        let r = value >> 1;
        self.regs.p.update_nz(r);
        r
    }

    fn do_rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.is_set(flags::C));
        self.regs.p.set_if(flags::C, value & 0x80 != 0);
        let r = value << 1 | carry_in;
        self.regs.p.update_nz(r);
        r
    }

    fn do_ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.p.is_set(flags::C) { 0x80 } else { 0 };
        self.regs.p.set_if(flags::C, value & 0x01 != 0);
        let r = value >> 1 | carry_in;
        self.regs.p.update_nz(r);
        r
    }

    // === Stack ===

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let addr = self.regs.push_addr();
        bus.write(addr, value);
    }

    fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.regs.pull_addr();
        bus.read(addr)
    }
}

impl Default for Rp2a03 {
    fn default() -> Self {
        Self::new()
    }
}

const fn page_crossed(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

#[cfg(test)]
mod tests {
    use super::*;
    use fami_core::SimpleBus;

    #[test]
    fn reset_reads_vector() {
        let mut bus = SimpleBus::new();
        bus.write(RESET_VECTOR, 0x00);
        bus.write(RESET_VECTOR + 1, 0x80);
        let mut cpu = Rp2a03::new();
        cpu.reset(&mut bus);
        assert_eq!(cpu.regs.pc, 0x8000);
        assert_eq!(cpu.regs.s, 0xFD);
        assert_eq!(cpu.regs.p.0, 0x34);
    }

    #[test]
    fn first_tick_executes_then_idles() {
        let mut bus = SimpleBus::new();
        bus.load(0x0200, &[0xEA, 0xEA]); // NOP; NOP
        let mut cpu = Rp2a03::new();
        cpu.regs.pc = 0x0200;

        cpu.tick(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0201);
        assert!(!cpu.instruction_complete());
        cpu.tick(&mut bus);
        assert!(cpu.instruction_complete());
        // Next tick fetches the second NOP
        cpu.tick(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0202);
    }

    #[test]
    fn sbc_is_adc_of_complement() {
        let mut cpu = Rp2a03::new();
        cpu.regs.a = 0x50;
        cpu.regs.p.set(flags::C); // No borrow
        cpu.sbc(0x10);
        assert_eq!(cpu.regs.a, 0x40);
        assert!(cpu.regs.p.is_set(flags::C));
    }
}
