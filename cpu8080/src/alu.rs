//! Arithmetic/logic primitives operating on the accumulator (spec.md §4.4).
//!
//! Every primitive sets S, Z, P from the 8-bit result byte. CF and AF are
//! defined per operation. ADC/SBB are computed with the carry-in folded
//! into a wide (9-bit-equivalent) sum rather than pre-adding it into the
//! operand in 8-bit arithmetic, which is how the Z80 sibling in this
//! workspace already avoids losing the carry contribution at the
//! `x = 0xFF, carry = 1` edge case (see `cpu-z80`'s `adc_a`/`sbc_a`) —
//! spec.md §9 calls out the same fix as required here.

use crate::flags::{FLAG_A, FLAG_C};
use crate::Cpu8080;

impl Cpu8080 {
    pub(crate) fn add(&mut self, x: u8) {
        let a = self.regs.a;
        let sum = u16::from(a) + u16::from(x);
        let result = sum as u8;

        self.put(FLAG_C, sum > 0xFF);
        self.put(FLAG_A, (a & 0x0F) + (x & 0x0F) > 0x0F);
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn adc(&mut self, x: u8) {
        let a = self.regs.a;
        let carry_in = u16::from(self.test(FLAG_C));
        let sum = u16::from(a) + u16::from(x) + carry_in;
        let result = sum as u8;

        self.put(FLAG_C, sum > 0xFF);
        self.put(FLAG_A, (a & 0x0F) + (x & 0x0F) + carry_in as u8 > 0x0F);
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn sub(&mut self, x: u8) {
        let a = self.regs.a;
        let result = a.wrapping_sub(x);

        self.put(FLAG_C, x > a);
        self.put(FLAG_A, (a & 0x0F) >= (x & 0x0F));
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn sbb(&mut self, x: u8) {
        let a = self.regs.a;
        let carry_in = i32::from(self.test(FLAG_C));
        let diff = i32::from(a) - i32::from(x) - carry_in;
        let result = diff as u8;

        self.put(FLAG_C, diff < 0);
        self.put(
            FLAG_A,
            i32::from(a & 0x0F) - i32::from(x & 0x0F) - carry_in >= 0,
        );
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn and(&mut self, x: u8) {
        let result = self.regs.a & x;
        // 8080 hardware convention: AF reflects the OR of the two
        // operands' bit 3, not a literal nibble-carry (spec.md §4.4, §9).
        self.put(FLAG_A, (self.regs.a | x) & 0x08 != 0);
        self.clear(FLAG_C);
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn or(&mut self, x: u8) {
        let result = self.regs.a | x;
        self.clear(FLAG_C);
        self.clear(FLAG_A);
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn xor(&mut self, x: u8) {
        let result = self.regs.a ^ x;
        self.clear(FLAG_C);
        self.clear(FLAG_A);
        self.set_szp(result);
        self.regs.a = result;
    }

    pub(crate) fn cmp(&mut self, x: u8) {
        let saved = self.regs.a;
        self.sub(x);
        self.regs.a = saved;
    }

    pub(crate) fn rlc(&mut self) {
        let a = self.regs.a;
        let carry = a & 0x80 != 0;
        self.regs.a = a.rotate_left(1);
        self.put(FLAG_C, carry);
    }

    pub(crate) fn rrc(&mut self) {
        let a = self.regs.a;
        let carry = a & 0x01 != 0;
        self.regs.a = a.rotate_right(1);
        self.put(FLAG_C, carry);
    }

    pub(crate) fn ral(&mut self) {
        let a = self.regs.a;
        let carry_in = u8::from(self.test(FLAG_C));
        self.put(FLAG_C, a & 0x80 != 0);
        self.regs.a = (a << 1) | carry_in;
    }

    pub(crate) fn rar(&mut self) {
        let a = self.regs.a;
        let carry_in = u8::from(self.test(FLAG_C));
        self.put(FLAG_C, a & 0x01 != 0);
        self.regs.a = (a >> 1) | (carry_in << 7);
    }

    /// DAA: decimal-adjust A after a BCD addition.
    pub(crate) fn daa(&mut self) {
        let mut a = self.regs.a;
        let mut carry = self.test(FLAG_C);

        let low = a & 0x0F;
        if low > 9 || self.test(FLAG_A) {
            self.put(FLAG_A, (low as u16 + 6) > 0x0F);
            a = a.wrapping_add(6);
        } else {
            self.clear(FLAG_A);
        }

        let high = a >> 4;
        if high > 9 || self.test(FLAG_C) {
            carry = carry || high > 9;
            a = a.wrapping_add(0x60);
        }

        self.put(FLAG_C, carry);
        self.set_szp(a);
        self.regs.a = a;
    }
}
