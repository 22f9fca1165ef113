//! Opcode dispatch table.
//!
//! A dense 256-entry table keyed by the opcode byte. Each entry names the
//! mnemonic, the addressing mode, the base cycle count, and whether an
//! indexed page crossing charges an extra cycle. Unassigned slots carry the
//! invalid-opcode entry.

/// Addressing modes of the official instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddrMode {
    /// No operand.
    Imp,
    /// Operates on the accumulator.
    Acc,
    /// Operand is the next byte.
    Imm,
    /// Operand at a zero-page address.
    Zp,
    /// Zero-page address indexed by X, wrapping in page 0.
    ZpX,
    /// Zero-page address indexed by Y, wrapping in page 0.
    ZpY,
    /// Operand at a 16-bit address.
    Abs,
    /// Absolute address indexed by X.
    AbsX,
    /// Absolute address indexed by Y.
    AbsY,
    /// JMP through a 16-bit pointer (with the page-wrap bug).
    Ind,
    /// Pointer in page 0 at operand+X, then indirect.
    IndX,
    /// Pointer in page 0 at operand, then indexed by Y.
    IndY,
    /// Signed 8-bit branch displacement.
    Rel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    Invalid,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpEntry {
    pub mnemonic: Mnemonic,
    pub mode: AddrMode,
    pub cycles: u8,
    /// Whether an indexed page crossing adds a cycle (read ops only).
    pub page_penalty: bool,
}

impl OpEntry {
    const fn new(mnemonic: Mnemonic, mode: AddrMode, cycles: u8, page_penalty: bool) -> Self {
        Self {
            mnemonic,
            mode,
            cycles,
            page_penalty,
        }
    }

    const fn invalid() -> Self {
        Self::new(Mnemonic::Invalid, AddrMode::Imp, 2, false)
    }
}

pub(crate) static OPCODES: [OpEntry; 256] = {
    use AddrMode::*;
    use Mnemonic::*;

    let mut t = [OpEntry::invalid(); 256];

    // Arithmetic
    t[0x69] = OpEntry::new(Adc, Imm, 2, false);
    t[0x65] = OpEntry::new(Adc, Zp, 3, false);
    t[0x75] = OpEntry::new(Adc, ZpX, 4, false);
    t[0x6D] = OpEntry::new(Adc, Abs, 4, false);
    t[0x7D] = OpEntry::new(Adc, AbsX, 4, true);
    t[0x79] = OpEntry::new(Adc, AbsY, 4, true);
    t[0x61] = OpEntry::new(Adc, IndX, 6, false);
    t[0x71] = OpEntry::new(Adc, IndY, 5, true);

    t[0xE9] = OpEntry::new(Sbc, Imm, 2, false);
    t[0xE5] = OpEntry::new(Sbc, Zp, 3, false);
    t[0xF5] = OpEntry::new(Sbc, ZpX, 4, false);
    t[0xED] = OpEntry::new(Sbc, Abs, 4, false);
    t[0xFD] = OpEntry::new(Sbc, AbsX, 4, true);
    t[0xF9] = OpEntry::new(Sbc, AbsY, 4, true);
    t[0xE1] = OpEntry::new(Sbc, IndX, 6, false);
    t[0xF1] = OpEntry::new(Sbc, IndY, 5, true);

    // Logic
    t[0x29] = OpEntry::new(And, Imm, 2, false);
    t[0x25] = OpEntry::new(And, Zp, 3, false);
    t[0x35] = OpEntry::new(And, ZpX, 4, false);
    t[0x2D] = OpEntry::new(And, Abs, 4, false);
    t[0x3D] = OpEntry::new(And, AbsX, 4, true);
    t[0x39] = OpEntry::new(And, AbsY, 4, true);
    t[0x21] = OpEntry::new(And, IndX, 6, false);
    t[0x31] = OpEntry::new(And, IndY, 5, true);

    t[0x09] = OpEntry::new(Ora, Imm, 2, false);
    t[0x05] = OpEntry::new(Ora, Zp, 3, false);
    t[0x15] = OpEntry::new(Ora, ZpX, 4, false);
    t[0x0D] = OpEntry::new(Ora, Abs, 4, false);
    t[0x1D] = OpEntry::new(Ora, AbsX, 4, true);
    t[0x19] = OpEntry::new(Ora, AbsY, 4, true);
    t[0x01] = OpEntry::new(Ora, IndX, 6, false);
    t[0x11] = OpEntry::new(Ora, IndY, 5, true);

    t[0x49] = OpEntry::new(Eor, Imm, 2, false);
    t[0x45] = OpEntry::new(Eor, Zp, 3, false);
    t[0x55] = OpEntry::new(Eor, ZpX, 4, false);
    t[0x4D] = OpEntry::new(Eor, Abs, 4, false);
    t[0x5D] = OpEntry::new(Eor, AbsX, 4, true);
    t[0x59] = OpEntry::new(Eor, AbsY, 4, true);
    t[0x41] = OpEntry::new(Eor, IndX, 6, false);
    t[0x51] = OpEntry::new(Eor, IndY, 5, true);

    t[0x24] = OpEntry::new(Bit, Zp, 3, false);
    t[0x2C] = OpEntry::new(Bit, Abs, 4, false);

    // Shifts and rotates
    t[0x0A] = OpEntry::new(Asl, Acc, 2, false);
    t[0x06] = OpEntry::new(Asl, Zp, 5, false);
    t[0x16] = OpEntry::new(Asl, ZpX, 6, false);
    t[0x0E] = OpEntry::new(Asl, Abs, 6, false);
    t[0x1E] = OpEntry::new(Asl, AbsX, 7, false);

    t[0x4A] = OpEntry::new(Lsr, Acc, 2, false);
    t[0x46] = OpEntry::new(Lsr, Zp, 5, false);
    t[0x56] = OpEntry::new(Lsr, ZpX, 6, false);
    t[0x4E] = OpEntry::new(Lsr, Abs, 6, false);
    t[0x5E] = OpEntry::new(Lsr, AbsX, 7, false);

    t[0x2A] = OpEntry::new(Rol, Acc, 2, false);
    t[0x26] = OpEntry::new(Rol, Zp, 5, false);
    t[0x36] = OpEntry::new(Rol, ZpX, 6, false);
    t[0x2E] = OpEntry::new(Rol, Abs, 6, false);
    t[0x3E] = OpEntry::new(Rol, AbsX, 7, false);

    t[0x6A] = OpEntry::new(Ror, Acc, 2, false);
    t[0x66] = OpEntry::new(Ror, Zp, 5, false);
    t[0x76] = OpEntry::new(Ror, ZpX, 6, false);
    t[0x6E] = OpEntry::new(Ror, Abs, 6, false);
    t[0x7E] = OpEntry::new(Ror, AbsX, 7, false);

    // Compares
    t[0xC9] = OpEntry::new(Cmp, Imm, 2, false);
    t[0xC5] = OpEntry::new(Cmp, Zp, 3, false);
    t[0xD5] = OpEntry::new(Cmp, ZpX, 4, false);
    t[0xCD] = OpEntry::new(Cmp, Abs, 4, false);
    t[0xDD] = OpEntry::new(Cmp, AbsX, 4, true);
    t[0xD9] = OpEntry::new(Cmp, AbsY, 4, true);
    t[0xC1] = OpEntry::new(Cmp, IndX, 6, false);
    t[0xD1] = OpEntry::new(Cmp, IndY, 5, true);

    t[0xE0] = OpEntry::new(Cpx, Imm, 2, false);
    t[0xE4] = OpEntry::new(Cpx, Zp, 3, false);
    t[0xEC] = OpEntry::new(Cpx, Abs, 4, false);

    t[0xC0] = OpEntry::new(Cpy, Imm, 2, false);
    t[0xC4] = OpEntry::new(Cpy, Zp, 3, false);
    t[0xCC] = OpEntry::new(Cpy, Abs, 4, false);

    // Branches
    t[0x90] = OpEntry::new(Bcc, Rel, 2, false);
    t[0xB0] = OpEntry::new(Bcs, Rel, 2, false);
    t[0xF0] = OpEntry::new(Beq, Rel, 2, false);
    t[0x30] = OpEntry::new(Bmi, Rel, 2, false);
    t[0xD0] = OpEntry::new(Bne, Rel, 2, false);
    t[0x10] = OpEntry::new(Bpl, Rel, 2, false);
    t[0x50] = OpEntry::new(Bvc, Rel, 2, false);
    t[0x70] = OpEntry::new(Bvs, Rel, 2, false);

    // Flag operations
    t[0x18] = OpEntry::new(Clc, Imp, 2, false);
    t[0x38] = OpEntry::new(Sec, Imp, 2, false);
    t[0x58] = OpEntry::new(Cli, Imp, 2, false);
    t[0x78] = OpEntry::new(Sei, Imp, 2, false);
    t[0xD8] = OpEntry::new(Cld, Imp, 2, false);
    t[0xF8] = OpEntry::new(Sed, Imp, 2, false);
    t[0xB8] = OpEntry::new(Clv, Imp, 2, false);

    // Loads
    t[0xA9] = OpEntry::new(Lda, Imm, 2, false);
    t[0xA5] = OpEntry::new(Lda, Zp, 3, false);
    t[0xB5] = OpEntry::new(Lda, ZpX, 4, false);
    t[0xAD] = OpEntry::new(Lda, Abs, 4, false);
    t[0xBD] = OpEntry::new(Lda, AbsX, 4, true);
    t[0xB9] = OpEntry::new(Lda, AbsY, 4, true);
    t[0xA1] = OpEntry::new(Lda, IndX, 6, false);
    t[0xB1] = OpEntry::new(Lda, IndY, 5, true);

    t[0xA2] = OpEntry::new(Ldx, Imm, 2, false);
    t[0xA6] = OpEntry::new(Ldx, Zp, 3, false);
    t[0xB6] = OpEntry::new(Ldx, ZpY, 4, false);
    t[0xAE] = OpEntry::new(Ldx, Abs, 4, false);
    t[0xBE] = OpEntry::new(Ldx, AbsY, 4, true);

    t[0xA0] = OpEntry::new(Ldy, Imm, 2, false);
    t[0xA4] = OpEntry::new(Ldy, Zp, 3, false);
    t[0xB4] = OpEntry::new(Ldy, ZpX, 4, false);
    t[0xAC] = OpEntry::new(Ldy, Abs, 4, false);
    t[0xBC] = OpEntry::new(Ldy, AbsX, 4, true);

    // Stores
    t[0x85] = OpEntry::new(Sta, Zp, 3, false);
    t[0x95] = OpEntry::new(Sta, ZpX, 4, false);
    t[0x8D] = OpEntry::new(Sta, Abs, 4, false);
    t[0x9D] = OpEntry::new(Sta, AbsX, 5, false);
    t[0x99] = OpEntry::new(Sta, AbsY, 5, false);
    t[0x81] = OpEntry::new(Sta, IndX, 6, false);
    t[0x91] = OpEntry::new(Sta, IndY, 6, false);

    t[0x86] = OpEntry::new(Stx, Zp, 3, false);
    t[0x96] = OpEntry::new(Stx, ZpY, 4, false);
    t[0x8E] = OpEntry::new(Stx, Abs, 4, false);

    t[0x84] = OpEntry::new(Sty, Zp, 3, false);
    t[0x94] = OpEntry::new(Sty, ZpX, 4, false);
    t[0x8C] = OpEntry::new(Sty, Abs, 4, false);

    // Transfers
    t[0xAA] = OpEntry::new(Tax, Imp, 2, false);
    t[0xA8] = OpEntry::new(Tay, Imp, 2, false);
    t[0xBA] = OpEntry::new(Tsx, Imp, 2, false);
    t[0x8A] = OpEntry::new(Txa, Imp, 2, false);
    t[0x9A] = OpEntry::new(Txs, Imp, 2, false);
    t[0x98] = OpEntry::new(Tya, Imp, 2, false);

    // Increments and decrements
    t[0xE6] = OpEntry::new(Inc, Zp, 5, false);
    t[0xF6] = OpEntry::new(Inc, ZpX, 6, false);
    t[0xEE] = OpEntry::new(Inc, Abs, 6, false);
    t[0xFE] = OpEntry::new(Inc, AbsX, 7, false);

    t[0xC6] = OpEntry::new(Dec, Zp, 5, false);
    t[0xD6] = OpEntry::new(Dec, ZpX, 6, false);
    t[0xCE] = OpEntry::new(Dec, Abs, 6, false);
    t[0xDE] = OpEntry::new(Dec, AbsX, 7, false);

    t[0xE8] = OpEntry::new(Inx, Imp, 2, false);
    t[0xC8] = OpEntry::new(Iny, Imp, 2, false);
    t[0xCA] = OpEntry::new(Dex, Imp, 2, false);
    t[0x88] = OpEntry::new(Dey, Imp, 2, false);

    // Control flow
    t[0x4C] = OpEntry::new(Jmp, Abs, 3, false);
    t[0x6C] = OpEntry::new(Jmp, Ind, 5, false);
    t[0x20] = OpEntry::new(Jsr, Abs, 6, false);
    t[0x60] = OpEntry::new(Rts, Imp, 6, false);
    t[0x00] = OpEntry::new(Brk, Imp, 7, false);
    t[0x40] = OpEntry::new(Rti, Imp, 6, false);

    // Stack
    t[0x48] = OpEntry::new(Pha, Imp, 3, false);
    t[0x08] = OpEntry::new(Php, Imp, 3, false);
    t[0x68] = OpEntry::new(Pla, Imp, 4, false);
    t[0x28] = OpEntry::new(Plp, Imp, 4, false);

    t[0xEA] = OpEntry::new(Nop, Imp, 2, false);

    t
};
