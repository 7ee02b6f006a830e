//! CPU execution interface.

/// A CPU that executes instructions against memory and I/O it owns.
///
/// Unlike a bus-sharing CPU core (where multiple chips contend for a
/// common `Bus`), an 8080-style core owns its 64KB memory and 256-port
/// I/O space outright, so `step`/`reset` take no bus parameter.
pub trait Cpu {
    /// Execute one instruction. Returns the number of cycles it took.
    fn step(&mut self) -> u32;

    /// Reset the CPU to its initial state.
    fn reset(&mut self);

    /// Get the current program counter.
    fn pc(&self) -> u16;

    /// Returns true if the CPU is halted (HLT executed, no interrupt since).
    fn is_halted(&self) -> bool;
}
