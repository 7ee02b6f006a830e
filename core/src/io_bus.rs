//! 8-bit I/O port space interface.

/// A 256-entry I/O port space, addressed by 8-bit port number.
///
/// The 8080 keeps its I/O space separate from memory (IN/OUT vs. the
/// memory-referencing instructions), so `IoBus` does not extend `Bus`.
pub trait IoBus {
    /// Read a byte from the given port.
    fn read_io(&self, port: u8) -> u8;

    /// Write a byte to the given port.
    fn write_io(&mut self, port: u8, value: u8);
}
