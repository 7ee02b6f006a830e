//! Pure decoder for the 8080 instruction stream (spec.md §4.6).
//!
//! `decode` never consults CPU state — it reads bytes through `Bus` and
//! returns a record describing one instruction. `decode_attached` adds
//! the flag-aware annotation spec.md §4.6 allows: for a conditional
//! CALL/RET it reports whether the condition currently holds and the
//! cycle cost the instruction would actually incur.

use emu_core::Bus;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub mnemonic: String,
    pub length: u8,
    pub branch: Option<BranchAnnotation>,
}

/// Flag-dependent cost annotation for a conditional CALL or RET,
/// produced only by `decode_attached`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchAnnotation {
    pub taken: bool,
    pub cycles: u8,
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{:04X}  {:<9}{}", self.address, hex.join(" "), self.mnemonic)
    }
}

fn reg_name(index: u8) -> &'static str {
    match index {
        0 => "B",
        1 => "C",
        2 => "D",
        3 => "E",
        4 => "H",
        5 => "L",
        6 => "M",
        7 => "A",
        _ => unreachable!("3-bit register field"),
    }
}

/// Register-pair name as it appears in LXI/INX/DCX/DAD/STAX/LDAX mnemonics.
fn rp_name(rp: u8) -> &'static str {
    match rp {
        0 => "B",
        1 => "D",
        2 => "H",
        3 => "SP",
        _ => unreachable!("2-bit register pair field"),
    }
}

/// Register-pair name as it appears in PUSH/POP mnemonics, where the
/// fourth slot is the accumulator+flags pair rather than SP.
fn push_pop_name(rp: u8) -> &'static str {
    if rp == 3 { "PSW" } else { rp_name(rp) }
}

fn cc_name(cc: u8) -> &'static str {
    match cc {
        0 => "NZ",
        1 => "Z",
        2 => "NC",
        3 => "C",
        4 => "PO",
        5 => "PE",
        6 => "P",
        7 => "M",
        _ => unreachable!("3-bit condition field"),
    }
}

fn condition(cc: u8, flags: u8) -> bool {
    use crate::flag_bits::{FLAG_C, FLAG_P, FLAG_S, FLAG_Z};
    match cc {
        0 => flags & FLAG_Z == 0,
        1 => flags & FLAG_Z != 0,
        2 => flags & FLAG_C == 0,
        3 => flags & FLAG_C != 0,
        4 => flags & FLAG_P == 0,
        5 => flags & FLAG_P != 0,
        6 => flags & FLAG_S == 0,
        7 => flags & FLAG_S != 0,
        _ => unreachable!("3-bit condition field"),
    }
}

/// Flag bit positions, duplicated from `cpu-8080`'s `flags` module so this
/// crate need not depend back on it (which would create a dependency
/// cycle, since `cpu-8080` depends on `disasm-8080` for tracing).
mod flag_bits {
    pub const FLAG_C: u8 = 1 << 0;
    pub const FLAG_P: u8 = 1 << 2;
    pub const FLAG_Z: u8 = 1 << 6;
    pub const FLAG_S: u8 = 1 << 7;
}

/// Decode the instruction at `address`, reading as many bytes as the
/// opcode needs. Never fails: every byte maps to a documented 8080
/// opcode (spec.md §7).
#[must_use]
pub fn decode(bus: &dyn Bus, address: u16) -> Instruction {
    let opcode = bus.read_byte(address);
    let (mnemonic, length) = decode_mnemonic(bus, address, opcode);
    let bytes = (0..length)
        .map(|i| bus.read_byte(address.wrapping_add(u16::from(i))))
        .collect();
    Instruction { address, bytes, mnemonic, length, branch: None }
}

/// As `decode`, but for a conditional CALL/RET also evaluates `flags`
/// (the CPU's current F register) and reports whether the branch would
/// be taken and what it would cost (spec.md §4.6).
#[must_use]
pub fn decode_attached(bus: &dyn Bus, address: u16, flags: u8) -> Instruction {
    let mut instr = decode(bus, address);
    let opcode = instr.bytes[0];
    instr.branch = match opcode {
        0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
            let taken = condition((opcode >> 3) & 7, flags);
            Some(BranchAnnotation { taken, cycles: if taken { 17 } else { 11 } })
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
            let taken = condition((opcode >> 3) & 7, flags);
            Some(BranchAnnotation { taken, cycles: if taken { 11 } else { 5 } })
        }
        _ => None,
    };
    instr
}

fn fmt_imm8(bus: &dyn Bus, address: u16) -> (String, u8) {
    let value = bus.read_byte(address.wrapping_add(1));
    (format!("${value:02X}"), 2)
}

fn fmt_imm16(bus: &dyn Bus, address: u16) -> (String, u16, u8) {
    let low = bus.read_byte(address.wrapping_add(1));
    let high = bus.read_byte(address.wrapping_add(2));
    let value = u16::from_le_bytes([low, high]);
    (format!("${value:04X}"), value, 3)
}

#[allow(clippy::too_many_lines)]
fn decode_mnemonic(bus: &dyn Bus, address: u16, opcode: u8) -> (String, u8) {
    match opcode {
        0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => ("NOP".to_string(), 1),

        0x01 | 0x11 | 0x21 | 0x31 => {
            let rp = (opcode >> 4) & 3;
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("LXI  {},{}", rp_name(rp), operand), len)
        }

        0x02 | 0x12 => {
            let rp = if opcode == 0x02 { 0 } else { 1 };
            (format!("STAX {}", rp_name(rp)), 1)
        }

        0x0A | 0x1A => {
            let rp = if opcode == 0x0A { 0 } else { 1 };
            (format!("LDAX {}", rp_name(rp)), 1)
        }

        0x03 | 0x13 | 0x23 | 0x33 => (format!("INX  {}", rp_name((opcode >> 4) & 3)), 1),
        0x0B | 0x1B | 0x2B | 0x3B => (format!("DCX  {}", rp_name((opcode >> 4) & 3)), 1),

        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            (format!("INR  {}", reg_name((opcode >> 3) & 7)), 1)
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            (format!("DCR  {}", reg_name((opcode >> 3) & 7)), 1)
        }

        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let (operand, len) = fmt_imm8(bus, address);
            (format!("MVI  {},{}", reg_name((opcode >> 3) & 7), operand), len)
        }

        0x07 => ("RLC".to_string(), 1),
        0x0F => ("RRC".to_string(), 1),
        0x17 => ("RAL".to_string(), 1),
        0x1F => ("RAR".to_string(), 1),

        0x22 => {
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("SHLD {operand}"), len)
        }
        0x2A => {
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("LHLD {operand}"), len)
        }

        0x27 => ("DAA".to_string(), 1),
        0x2F => ("CMA".to_string(), 1),

        0x32 => {
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("STA  {operand}"), len)
        }
        0x3A => {
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("LDA  {operand}"), len)
        }

        0x37 => ("STC".to_string(), 1),
        0x3F => ("CMC".to_string(), 1),

        0x09 | 0x19 | 0x29 | 0x39 => (format!("DAD  {}", rp_name((opcode >> 4) & 3)), 1),

        0x76 => ("HLT".to_string(), 1),

        0x40..=0x7F => {
            let dst = (opcode >> 3) & 7;
            let src = opcode & 7;
            (format!("MOV  {},{}", reg_name(dst), reg_name(src)), 1)
        }

        0x80..=0xBF => {
            let alu_op = (opcode >> 3) & 7;
            let src = opcode & 7;
            let mnemonic = alu_mnemonic(alu_op);
            (format!("{mnemonic:<4} {}", reg_name(src)), 1)
        }

        0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
            (format!("R{}", cc_name((opcode >> 3) & 7)), 1)
        }

        0xC1 | 0xD1 | 0xE1 | 0xF1 => (format!("POP  {}", push_pop_name((opcode >> 4) & 3)), 1),

        0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
            let cc = cc_name((opcode >> 3) & 7);
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("J{cc:<3} {operand}"), len)
        }

        0xC3 | 0xCB => {
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("JMP  {operand}"), len)
        }

        0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
            let cc = cc_name((opcode >> 3) & 7);
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("C{cc:<3} {operand}"), len)
        }

        0xC5 | 0xD5 | 0xE5 | 0xF5 => (format!("PUSH {}", push_pop_name((opcode >> 4) & 3)), 1),

        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            let alu_op = (opcode >> 3) & 7;
            let mnemonic = immediate_alu_mnemonic(alu_op);
            let (operand, len) = fmt_imm8(bus, address);
            (format!("{mnemonic:<4} {operand}"), len)
        }

        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            let n = (opcode >> 3) & 7;
            (format!("RST  {n}"), 1)
        }

        0xC9 | 0xD9 => ("RET".to_string(), 1),

        0xCD | 0xDD | 0xED | 0xFD => {
            let (operand, _, len) = fmt_imm16(bus, address);
            (format!("CALL {operand}"), len)
        }

        0xD3 => {
            let (operand, len) = fmt_imm8(bus, address);
            (format!("OUT  {operand}"), len)
        }
        0xDB => {
            let (operand, len) = fmt_imm8(bus, address);
            (format!("IN   {operand}"), len)
        }

        0xE3 => ("XTHL".to_string(), 1),
        0xE9 => ("PCHL".to_string(), 1),
        0xEB => ("XCHG".to_string(), 1),
        0xF3 => ("DI".to_string(), 1),
        0xF9 => ("SPHL".to_string(), 1),
        0xFB => ("EI".to_string(), 1),
    }
}

fn alu_mnemonic(alu_op: u8) -> &'static str {
    match alu_op {
        0 => "ADD",
        1 => "ADC",
        2 => "SUB",
        3 => "SBB",
        4 => "ANA",
        5 => "XRA",
        6 => "ORA",
        7 => "CMP",
        _ => unreachable!("3-bit ALU operation field"),
    }
}

fn immediate_alu_mnemonic(alu_op: u8) -> &'static str {
    match alu_op {
        0 => "ADI",
        1 => "ACI",
        2 => "SUI",
        3 => "SBI",
        4 => "ANI",
        5 => "XRI",
        6 => "ORI",
        7 => "CPI",
        _ => unreachable!("3-bit ALU operation field"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatMemory(Vec<u8>);

    impl Bus for FlatMemory {
        fn read_byte(&self, address: u16) -> u8 {
            self.0.get(address as usize).copied().unwrap_or(0)
        }

        fn write_byte(&mut self, _address: u16, _value: u8) {
            unreachable!("decode never writes");
        }
    }

    #[test]
    fn decodes_lxi_with_word_operand() {
        let mem = FlatMemory(vec![0x21, 0xF4, 0x3C]);
        let instr = decode(&mem, 0);
        assert_eq!(instr.mnemonic, "LXI  H,$3CF4");
        assert_eq!(instr.length, 3);
        assert_eq!(instr.bytes, vec![0x21, 0xF4, 0x3C]);
    }

    #[test]
    fn decodes_mov_between_registers() {
        let mem = FlatMemory(vec![0x78]);
        let instr = decode(&mem, 0);
        assert_eq!(instr.mnemonic, "MOV  A,B");
        assert_eq!(instr.length, 1);
    }

    #[test]
    fn decodes_hlt_distinctly_from_mov() {
        let mem = FlatMemory(vec![0x76]);
        let instr = decode(&mem, 0);
        assert_eq!(instr.mnemonic, "HLT");
    }

    #[test]
    fn attached_decode_reports_taken_call() {
        let mem = FlatMemory(vec![0xCC, 0x34, 0x12]);
        let instr = decode_attached(&mem, 0, flag_bits::FLAG_Z);
        let branch = instr.branch.expect("CZ is a conditional call");
        assert!(branch.taken);
        assert_eq!(branch.cycles, 17);
    }

    #[test]
    fn attached_decode_reports_not_taken_return() {
        let mem = FlatMemory(vec![0xC8]);
        let instr = decode_attached(&mem, 0, 0);
        let branch = instr.branch.expect("RZ is a conditional return");
        assert!(!branch.taken);
        assert_eq!(branch.cycles, 5);
    }
}
