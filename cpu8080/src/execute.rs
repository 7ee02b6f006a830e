//! Instruction dispatch (spec.md §4.5).
//!
//! One match arm (or small family of arms sharing a bit-decoded register
//! field, the same technique the Z80 sibling in this workspace uses in
//! `cpu-z80`'s `execute_unprefixed`) per opcode. Every arm performs the
//! opcode's effect and, where it matters, returns whether a conditional
//! branch was taken; `step` adds the base `CYCLES` entry and (if taken)
//! `cycles::TAKEN_BRANCH_EXTRA`.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]

use emu_core::{Bus, IoBus};

use crate::flags::{FLAG_C, FLAG_P, FLAG_S, FLAG_Z};
use crate::Cpu8080;

impl Cpu8080 {
    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let value = self.memory.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word(&mut self) -> u16 {
        let low = self.fetch_byte();
        let high = self.fetch_byte();
        u16::from_le_bytes([low, high])
    }

    /// Read one of the 8 MOV/ALU/INR/DCR operands; index 6 is `(HL)`.
    fn get_operand(&self, index: u8) -> u8 {
        if index == 6 {
            self.memory.read_byte(self.regs.hl())
        } else {
            self.regs.read_field(index)
        }
    }

    fn set_operand(&mut self, index: u8, value: u8) {
        if index == 6 {
            self.memory.write_byte(self.regs.hl(), value);
        } else {
            self.regs.set_field(index, value);
        }
    }

    /// Evaluate one of the 8 branch conditions named by the middle 3 bits
    /// of a conditional jump/call/return opcode.
    fn condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.test(FLAG_Z), // NZ
            1 => self.test(FLAG_Z),  // Z
            2 => !self.test(FLAG_C), // NC
            3 => self.test(FLAG_C),  // C
            4 => !self.test(FLAG_P), // PO
            5 => self.test(FLAG_P),  // PE
            6 => !self.test(FLAG_S), // P (plus)
            7 => self.test(FLAG_S),  // M (minus)
            _ => unreachable!("3-bit condition field"),
        }
    }

    fn jump(&mut self, target: u16) {
        self.regs.pc = target;
        self.jumped = true;
    }

    fn call(&mut self, target: u16) {
        let return_addr = self.regs.pc;
        self.push_word(return_addr);
        self.jump(target);
    }

    fn ret(&mut self) {
        let target = self.pop_word();
        self.jump(target);
    }

    /// Execute `opcode`. Returns the extra cycles to add on top of the
    /// `CYCLES` table entry (spec.md §4.5): 6 when a conditional CALL/RET
    /// was taken, 0 otherwise.
    pub(crate) fn execute(&mut self, opcode: u8) -> u32 {
        match opcode {
            // NOP and its seven documented duplicate encodings.
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {}

            // LXI rp, d16
            0x01 | 0x11 | 0x21 | 0x31 => {
                let rp = (opcode >> 4) & 3;
                let value = self.fetch_word();
                self.regs.set_pair(rp, value);
            }

            // STAX rp (BC or DE only)
            0x02 | 0x12 => {
                let addr = if opcode == 0x02 { self.regs.bc() } else { self.regs.de() };
                self.memory.write_byte(addr, self.regs.a);
            }

            // LDAX rp (BC or DE only)
            0x0A | 0x1A => {
                let addr = if opcode == 0x0A { self.regs.bc() } else { self.regs.de() };
                self.regs.a = self.memory.read_byte(addr);
            }

            // INX rp
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = (opcode >> 4) & 3;
                let value = self.regs.read_pair(rp).wrapping_add(1);
                self.regs.set_pair(rp, value);
            }

            // DCX rp
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = (opcode >> 4) & 3;
                let value = self.regs.read_pair(rp).wrapping_sub(1);
                self.regs.set_pair(rp, value);
            }

            // INR r / INR M: S,Z,P set; AF set when the low nibble wraps; CF untouched.
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (opcode >> 3) & 7;
                let value = self.get_operand(r);
                let result = value.wrapping_add(1);
                self.put(crate::flags::FLAG_A, value & 0x0F == 0x0F);
                self.set_szp(result);
                self.set_operand(r, result);
            }

            // DCR r / DCR M
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = (opcode >> 3) & 7;
                let value = self.get_operand(r);
                let result = value.wrapping_sub(1);
                self.put(crate::flags::FLAG_A, value & 0x0F != 0);
                self.set_szp(result);
                self.set_operand(r, result);
            }

            // MVI r, d8 / MVI M, d8
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let r = (opcode >> 3) & 7;
                let value = self.fetch_byte();
                self.set_operand(r, value);
            }

            0x07 => self.rlc(),
            0x0F => self.rrc(),
            0x17 => self.ral(),
            0x1F => self.rar(),

            // SHLD a16
            0x22 => {
                let addr = self.fetch_word();
                self.memory.write_word(addr, self.regs.hl());
            }

            // LHLD a16
            0x2A => {
                let addr = self.fetch_word();
                let value = self.memory.read_word(addr);
                self.regs.set_hl(value);
            }

            0x27 => self.daa(),

            // CMA: A <- !A, flags unchanged
            0x2F => self.regs.a = !self.regs.a,

            // STA a16
            0x32 => {
                let addr = self.fetch_word();
                self.memory.write_byte(addr, self.regs.a);
            }

            // LDA a16
            0x3A => {
                let addr = self.fetch_word();
                self.regs.a = self.memory.read_byte(addr);
            }

            // STC
            0x37 => self.set(FLAG_C),

            // CMC
            0x3F => self.put(FLAG_C, !self.test(FLAG_C)),

            // DAD rp: HL += rp; only CF affected.
            0x09 | 0x19 | 0x29 | 0x39 => {
                let rp = (opcode >> 4) & 3;
                let operand = self.regs.read_pair(rp);
                let hl = self.regs.hl();
                let sum = u32::from(hl) + u32::from(operand);
                self.put(FLAG_C, sum > 0xFFFF);
                self.regs.set_hl(sum as u16);
            }

            // HLT
            0x76 => self.halted = true,

            // MOV r, r' (and MOV r,M / MOV M,r) — every other 0x40..0x7F opcode.
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 7;
                let src = opcode & 7;
                let value = self.get_operand(src);
                self.set_operand(dst, value);
            }

            // ADD/ADC/SUB/SBB/ANA/XRA/ORA/CMP r or M
            0x80..=0xBF => {
                let alu_op = (opcode >> 3) & 7;
                let src = opcode & 7;
                let value = self.get_operand(src);
                self.apply_alu(alu_op, value);
            }

            // RNZ/RZ/RNC/RC/RPO/RPE/RP/RM
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                let cc = (opcode >> 3) & 7;
                if self.condition(cc) {
                    self.ret();
                    return crate::cycles::TAKEN_BRANCH_EXTRA;
                }
            }

            // POP rp (BC, DE, HL, PSW)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let rp = (opcode >> 4) & 3;
                let value = self.pop_word();
                match rp {
                    0 => self.regs.set_bc(value),
                    1 => self.regs.set_de(value),
                    2 => self.regs.set_hl(value),
                    3 => self.regs.set_psw(value),
                    _ => unreachable!(),
                }
            }

            // JNZ/JZ/JNC/JC/JPO/JPE/JP/JM a16
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let cc = (opcode >> 3) & 7;
                let target = self.fetch_word();
                if self.condition(cc) {
                    self.jump(target);
                }
            }

            // JMP a16 and its documented alternate encoding
            0xC3 | 0xCB => {
                let target = self.fetch_word();
                self.jump(target);
            }

            // CNZ/CZ/CNC/CC/CPO/CPE/CP/CM a16
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let cc = (opcode >> 3) & 7;
                let target = self.fetch_word();
                if self.condition(cc) {
                    self.call(target);
                    return crate::cycles::TAKEN_BRANCH_EXTRA;
                }
            }

            // PUSH rp (BC, DE, HL, PSW)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let rp = (opcode >> 4) & 3;
                let value = match rp {
                    0 => self.regs.bc(),
                    1 => self.regs.de(),
                    2 => self.regs.hl(),
                    3 => self.regs.psw(),
                    _ => unreachable!(),
                };
                self.push_word(value);
            }

            // ADI/ACI/SUI/SBI/ANI/XRI/ORI/CPI d8
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let alu_op = (opcode >> 3) & 7;
                let value = self.fetch_byte();
                self.apply_alu(alu_op, value);
            }

            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let n = (opcode >> 3) & 7;
                self.call(u16::from(n) * 8);
            }

            // RET and its documented alternate encoding
            0xC9 | 0xD9 => self.ret(),

            // CALL a16 and its documented alternate encodings
            0xCD | 0xDD | 0xED | 0xFD => {
                let target = self.fetch_word();
                self.call(target);
            }

            // OUT d8
            0xD3 => {
                let port = self.fetch_byte();
                self.io.write_io(port, self.regs.a);
            }

            // IN d8
            0xDB => {
                let port = self.fetch_byte();
                self.regs.a = self.io.read_io(port);
            }

            // XTHL
            0xE3 => {
                let tmp = self.memory.read_word(self.regs.sp);
                self.memory.write_word(self.regs.sp, self.regs.hl());
                self.regs.set_hl(tmp);
            }

            // PCHL
            0xE9 => self.jump(self.regs.hl()),

            // XCHG
            0xEB => {
                let hl = self.regs.hl();
                let de = self.regs.de();
                self.regs.set_hl(de);
                self.regs.set_de(hl);
            }

            // DI
            0xF3 => self.int_enabled = false,

            // SPHL
            0xF9 => self.regs.sp = self.regs.hl(),

            // EI
            0xFB => self.int_enabled = true,

            // Every remaining byte is covered by the ranges above; the 8080
            // instruction set has no genuinely undefined opcodes (spec.md
            // §1, §7) — unlike the duplicate NOP/JMP/CALL/RET encodings,
            // which are handled explicitly above, there is nothing left
            // to land here.
            _ => unreachable!("opcode {opcode:#04x} not covered by the 8080 instruction set"),
        }

        0
    }

    fn apply_alu(&mut self, alu_op: u8, value: u8) {
        match alu_op {
            0 => self.add(value),
            1 => self.adc(value),
            2 => self.sub(value),
            3 => self.sbb(value),
            4 => self.and(value),
            5 => self.xor(value),
            6 => self.or(value),
            7 => self.cmp(value),
            _ => unreachable!("3-bit ALU operation field"),
        }
    }
}
