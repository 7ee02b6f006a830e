//! Minimal CP/M-style host overlay (spec.md §4.7).
//!
//! Reuses `cpu-8080` by hooking the two fixed addresses a CP/M guest
//! program CALLs into: 0x0000 (warm boot) and 0x0005 (BDOS entry). The
//! overlay is driven by the host's run loop, not wired into the CPU
//! itself — it inspects PC after each `step` and, when it lands on one
//! of the hooked addresses, services the call instead of letting guest
//! code run into unmapped memory.

use std::fmt;

use cpu_8080::Cpu8080;

/// The address a CP/M COM file is conventionally loaded and started at.
pub const DEFAULT_ORIGIN: u16 = 0x0100;

const WARM_BOOT: u16 = 0x0000;
const BDOS_ENTRY: u16 = 0x0005;
const STRING_DELIMITER: u8 = b'$';

/// Host-side console collaborator. The overlay never talks to stdio
/// directly (spec.md §1 draws the host boundary around frontends); the
/// embedder supplies this.
pub trait ConsoleIo {
    fn read_byte(&mut self) -> u8;
    fn write_byte(&mut self, byte: u8);
}

/// The sole recoverable error surface of this workspace (spec.md §7):
/// a BDOS function code outside the documented subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpmError {
    UnknownFunction(u8),
}

impl fmt::Display for CpmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpmError::UnknownFunction(code) => {
                write!(f, "unknown BDOS function {code:#04x} (C register at CALL 0x0005)")
            }
        }
    }
}

impl std::error::Error for CpmError {}

/// Intercepts CALL 0x0000 / CALL 0x0005 on behalf of a `Cpu8080`.
pub struct CpmHost {
    origin: u16,
}

impl Default for CpmHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CpmHost {
    #[must_use]
    pub fn new() -> Self {
        Self { origin: DEFAULT_ORIGIN }
    }

    #[must_use]
    pub fn with_origin(origin: u16) -> Self {
        Self { origin }
    }

    /// Check `cpu`'s current PC and service it if it lands on a hooked
    /// address. Returns `true` if the call was intercepted (the host
    /// should skip calling `cpu.step()` for this cycle), `false` if PC
    /// is ordinary guest code.
    ///
    /// # Errors
    ///
    /// Returns `CpmError::UnknownFunction` if register C names a BDOS
    /// function outside the documented subset (spec.md §7); the CPU
    /// state is left exactly as it was at the fault point.
    pub fn intercept(
        &self,
        cpu: &mut Cpu8080,
        console: &mut impl ConsoleIo,
    ) -> Result<bool, CpmError> {
        match cpu.pc() {
            WARM_BOOT => {
                cpu.reset_cpu();
                Ok(true)
            }
            BDOS_ENTRY => {
                self.bdos_call(cpu, console)?;
                // The guest executed `CALL 0x0005`, which already pushed
                // the return address; servicing the call in place of the
                // routine that would otherwise live at 0x0005 means we
                // owe it the RET that routine would have executed.
                cpu.execute_opcode(0xC9);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn bdos_call(&self, cpu: &mut Cpu8080, console: &mut impl ConsoleIo) -> Result<(), CpmError> {
        let function = cpu.registers().c;
        match function {
            0x00 => {
                // Terminate: there is no process table to unwind, so a
                // guest "exit" looks like HLT to the embedder.
                cpu.execute_opcode(0x76);
            }
            0x01 => {
                let byte = console.read_byte();
                console.write_byte(byte);
                cpu.registers_mut().a = byte;
            }
            0x02 => {
                let byte = cpu.registers().e;
                console.write_byte(byte);
            }
            0x06 => {
                if cpu.registers().e == 0xFF {
                    cpu.registers_mut().a = console.read_byte();
                } else {
                    let byte = cpu.registers().e;
                    console.write_byte(byte);
                }
            }
            0x09 => {
                let mut addr = cpu.registers().de();
                loop {
                    let byte = cpu.read_byte(addr);
                    if byte == STRING_DELIMITER {
                        break;
                    }
                    console.write_byte(byte);
                    addr = addr.wrapping_add(1);
                }
            }
            0x0A => {
                let buffer = cpu.registers().de();
                let max_len = cpu.read_byte(buffer).max(1);
                let mut count = 0u8;
                while count < max_len {
                    let byte = console.read_byte();
                    if byte == b'\r' || byte == b'\n' {
                        break;
                    }
                    cpu.write_byte(buffer.wrapping_add(2).wrapping_add(u16::from(count)), byte);
                    count += 1;
                }
                cpu.write_byte(buffer.wrapping_add(1), count);
            }
            0x0C => {
                // Report CP/M 2.2, the version this BDOS subset imitates.
                cpu.registers_mut().h = 0x00;
                cpu.registers_mut().l = 0x22;
            }
            other => return Err(CpmError::UnknownFunction(other)),
        }
        Ok(())
    }
}
