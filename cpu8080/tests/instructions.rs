//! Integration tests for the quantified invariants of spec.md §8.
//!
//! Unlike the scenario tests living beside the implementation (`src/lib.rs`),
//! these only use the public `Cpu8080` surface: load a byte program, run or
//! step it, and check registers/flags/memory.

use cpu_8080::{Cpu8080, CpuOptions, FLAG_A, FLAG_C, FLAG_P, FLAG_S, FLAG_Z};

fn cpu() -> Cpu8080 {
    Cpu8080::new(CpuOptions::default())
}

/// ADD B with A and B set by MVI, then HLT.
fn add_program(a: u8, b: u8) -> Cpu8080 {
    let mut cpu = cpu();
    cpu.load(&[0x3E, a, 0x06, b, 0x80, 0x76]);
    cpu.run();
    cpu
}

#[test]
fn szp_flags_agree_with_the_result_byte_for_every_value() {
    for x in 0u16..=255 {
        let x = x as u8;
        let mut cpu = cpu();
        cpu.load(&[0x3E, x, 0xB7, 0x76]); // MVI A,x; ORA A (pure S/Z/P, CF=AF=0); HLT
        cpu.run();

        assert_eq!(cpu.test(FLAG_S), x & 0x80 != 0, "SF for {x:#04x}");
        assert_eq!(cpu.test(FLAG_Z), x == 0, "ZF for {x:#04x}");
        assert_eq!(cpu.test(FLAG_P), x.count_ones() % 2 == 0, "PF for {x:#04x}");
    }
}

#[test]
fn add_matches_the_specified_result_and_carry_formula() {
    let cases: [(u8, u8); 6] = [(0, 0), (0xFF, 1), (0x7F, 1), (0x0F, 0x01), (0x80, 0x80), (200, 100)];
    for (a, b) in cases {
        let cpu = add_program(a, b);
        let expected = a.wrapping_add(b);
        let sum = u16::from(a) + u16::from(b);

        assert_eq!(cpu.registers().a, expected, "a={a:#04x} b={b:#04x}");
        assert_eq!(cpu.test(FLAG_C), sum > 0xFF, "carry for a={a:#04x} b={b:#04x}");
        assert_eq!(
            cpu.test(FLAG_A),
            (a & 0x0F) + (b & 0x0F) > 0x0F,
            "aux carry for a={a:#04x} b={b:#04x}"
        );
    }
}

#[test]
fn memory_word_round_trips_for_every_address_but_the_top_of_the_space() {
    let mut cpu = cpu();
    cpu.load(&[0x76]);
    for addr in [0x0000u16, 0x0001, 0x1234, 0x8000, 0xFFFE] {
        for w in [0x0000u16, 0x00FF, 0xABCD, 0xFFFF] {
            cpu.write_byte(addr, (w & 0xFF) as u8);
            cpu.write_byte(addr.wrapping_add(1), (w >> 8) as u8);
            let low = u16::from(cpu.read_byte(addr));
            let high = u16::from(cpu.read_byte(addr.wrapping_add(1)));
            assert_eq!(low | (high << 8), w);
        }
    }
}

#[test]
fn writing_the_high_half_of_hl_is_visible_through_the_pair_view() {
    let mut cpu = cpu();
    // LXI H,$1234; MVI H,$56; HLT
    cpu.load(&[0x21, 0x34, 0x12, 0x26, 0x56, 0x76]);
    cpu.run();
    assert_eq!(cpu.registers().hl(), 0x5634, "only the high byte should have changed");
    assert_eq!(cpu.registers().l, 0x34, "low byte untouched");
}

#[test]
fn xchg_is_its_own_inverse() {
    let mut cpu = cpu();
    // LXI H,$1122; LXI D,$3344; XCHG; XCHG; HLT
    cpu.load(&[0x21, 0x22, 0x11, 0x11, 0x44, 0x33, 0xEB, 0xEB, 0x76]);
    cpu.run();
    assert_eq!(cpu.registers().hl(), 0x1122);
    assert_eq!(cpu.registers().de(), 0x3344);
}

#[test]
fn xthl_is_its_own_inverse_when_memory_is_unchanged_between_calls() {
    let mut cpu = cpu();
    // LXI SP,$2000; LXI H,$1234; XTHL; XTHL; HLT
    cpu.load(&[0x31, 0x00, 0x20, 0x21, 0x34, 0x12, 0xE3, 0xE3, 0x76]);
    cpu.write_byte(0x2000, 0xAA);
    cpu.write_byte(0x2001, 0xBB);
    cpu.run();
    assert_eq!(cpu.registers().hl(), 0x1234);
    assert_eq!(cpu.read_byte(0x2000), 0xAA);
    assert_eq!(cpu.read_byte(0x2001), 0xBB);
}

#[test]
fn cmp_sets_flags_like_sub_but_leaves_the_accumulator_alone() {
    let mut cpu = cpu();
    // MVI A,$10; MVI B,$11; CMP B; HLT  (A - B borrows)
    cpu.load(&[0x3E, 0x10, 0x06, 0x11, 0xB8, 0x76]);
    cpu.run();
    assert_eq!(cpu.registers().a, 0x10, "CMP must not touch A");
    assert!(cpu.test(FLAG_C), "0x10 - 0x11 borrows");
}

#[test]
fn pop_psw_normalizes_the_reserved_flag_bits() {
    let mut cpu = cpu();
    // LXI SP,$2000; LXI H,$FF00 (F = 0x00 with all reserved bits clear);
    // PUSH H; POP PSW; HLT
    cpu.load(&[0x31, 0x00, 0x20, 0x21, 0x00, 0xFF, 0xE5, 0xF1, 0x76]);
    cpu.run();
    let f = cpu.registers().f;
    assert_eq!(f & 0x02, 0x02, "bit 1 must always read as 1 after POP PSW");
    assert_eq!(f & 0x08, 0x00, "bit 3 must always read as 0 after POP PSW");
    assert_eq!(f & 0x20, 0x00, "bit 5 must always read as 0 after POP PSW");
}
