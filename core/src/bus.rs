//! Byte-addressable memory interface.

/// A 64KB byte-addressable memory space.
///
/// `cpu-8080` implements this directly on its own `Memory`, but the trait
/// lives here so `disasm-8080` and `cpm-host` can read program bytes
/// without depending on `cpu-8080`'s internal types.
pub trait Bus {
    /// Read a byte from the given address.
    fn read_byte(&self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write_byte(&mut self, address: u16, value: u8);

    /// Read a little-endian word: low byte at `address`, high byte at
    /// `address + 1` (wrapping).
    fn read_word(&self, address: u16) -> u16 {
        let low = self.read_byte(address);
        let high = self.read_byte(address.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Write a little-endian word: low byte at `address`, high byte at
    /// `address + 1` (wrapping).
    fn write_word(&mut self, address: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write_byte(address, low);
        self.write_byte(address.wrapping_add(1), high);
    }
}
