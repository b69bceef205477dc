//! LDREX/STREX and the per-thread exclusive monitor.
//!
//! The monitor records the address and the value observed by the last
//! LDREX. The matching STREX succeeds only if the address still matches and
//! a compare-and-swap against the remembered value wins; it cannot tell a
//! word that never changed from one that was overwritten and restored.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::condition_passed;
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};

impl Armv7 {
    pub fn ldrex<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDREX";

        let cond;
        let t;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = (code & 0xFF) << 2;

                reject!(t == 13 || t == 15 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let addr = ctx.read_gpr(n).wrapping_add(imm32);
            let value = bus.read_32(addr);

            ctx.r_addr = addr;
            ctx.r_data = value;
            ctx.write_gpr(t, value);
        }

        Ok(())
    }

    pub fn strex<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STREX";

        let cond;
        let d;
        let t;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = (code & 0xFF) << 2;

                reject!(d == 13 || d == 15 || t == 13 || t == 15 || n == 15, NAME, enc, "UNPREDICTABLE");
                reject!(d == n || d == t, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let addr = ctx.read_gpr(n).wrapping_add(imm32);
            let value = ctx.read_gpr(t);

            let failed = ctx.r_addr == 0
                || addr != ctx.r_addr
                || bus.atomic_cas_32(addr, ctx.r_data, value) != ctx.r_data;

            ctx.write_gpr(d, failed as u32);
            ctx.r_addr = 0;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emulator::bus::testing::FlatBus;
    use crate::emulator::bus::Bus;
    use crate::emulator::cpu::{Armv7, Context, Encoding};

    fn ctx() -> Context {
        Context::new(1)
    }

    fn ldrex(t: u32, n: u32, imm8: u32) -> u32 {
        0xE850_0F00 | n << 16 | t << 12 | imm8
    }

    fn strex(d: u32, t: u32, n: u32, imm8: u32) -> u32 {
        0xE840_0000 | n << 16 | t << 12 | d << 8 | imm8
    }

    #[test]
    fn uncontended_pair_succeeds() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x100);
        ctx.write_gpr(1, 0x40);
        bus.write_32(0x40, 42);

        Armv7::ldrex(&mut ctx, ldrex(0, 1, 0), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 42);
        assert_eq!(ctx.r_addr, 0x40);
        assert_eq!(ctx.r_data, 42);

        ctx.write_gpr(3, 99);
        Armv7::strex(&mut ctx, strex(2, 3, 1, 0), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0);
        assert_eq!(bus.read_32(0x40), 99);
        assert_eq!(ctx.r_addr, 0);
    }

    #[test]
    fn interleaved_same_value_store_still_succeeds() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x100);
        ctx.write_gpr(1, 0x40);
        bus.write_32(0x40, 42);

        Armv7::ldrex(&mut ctx, ldrex(0, 1, 0), Encoding::T1, &mut bus).unwrap();

        // Another thread rewrites the same value; this monitor compares
        // values, not versions, so the store below still wins.
        bus.write_32(0x40, 42);

        ctx.write_gpr(3, 99);
        Armv7::strex(&mut ctx, strex(2, 3, 1, 0), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0);
        assert_eq!(bus.read_32(0x40), 99);
    }

    #[test]
    fn changed_value_fails_without_storing() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x100);
        ctx.write_gpr(1, 0x40);
        bus.write_32(0x40, 42);

        Armv7::ldrex(&mut ctx, ldrex(0, 1, 0), Encoding::T1, &mut bus).unwrap();
        bus.write_32(0x40, 43);

        ctx.write_gpr(3, 99);
        Armv7::strex(&mut ctx, strex(2, 3, 1, 0), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 1);
        assert_eq!(bus.read_32(0x40), 43);
        assert_eq!(ctx.r_addr, 0);
    }

    #[test]
    fn mismatched_address_fails_without_memory_access() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x100);
        ctx.write_gpr(1, 0x40);
        ctx.write_gpr(4, 0x80);
        bus.write_32(0x40, 42);
        bus.write_32(0x80, 7);

        Armv7::ldrex(&mut ctx, ldrex(0, 1, 0), Encoding::T1, &mut bus).unwrap();

        // STREX to a different address than the monitor holds.
        ctx.write_gpr(3, 99);
        Armv7::strex(&mut ctx, strex(2, 3, 4, 0), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 1);
        assert_eq!(bus.read_32(0x80), 7);
    }

    #[test]
    fn strex_without_prior_ldrex_fails() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x100);
        ctx.write_gpr(1, 0x40);
        ctx.write_gpr(3, 99);
        bus.write_32(0x40, 42);

        Armv7::strex(&mut ctx, strex(2, 3, 1, 0), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 1);
        assert_eq!(bus.read_32(0x40), 42);
    }

    #[test]
    fn strex_overlapping_registers_reject() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x100);

        let err = Armv7::strex(&mut ctx, strex(2, 2, 1, 0), Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, crate::emulator::cpu::OpcodeError::Rejected { .. }));
    }
}
