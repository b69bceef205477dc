//! Multiply, multiply-accumulate and the long forms.
//!
//! The Thumb-2 32-bit encodings never set flags; only the 16-bit `MULS`
//! form participates in the implicit flag-setting rule, and it updates N
//! and Z alone.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::condition_passed;
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};

impl Armv7 {
    pub fn mul<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MUL";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let m;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                m = d;
                n = (code & 0x38) >> 3;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = false;

                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n).wrapping_mul(ctx.read_gpr(m));
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_zero_and_sign(result);
            }
        }

        Ok(())
    }

    pub fn mla<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MLA";

        let cond;
        let d;
        let n;
        let m;
        let a;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                a = (code & 0xF000) >> 12;

                reject!(a == 15, NAME, enc, "MUL");
                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15 || a == 13, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx
                .read_gpr(n)
                .wrapping_mul(ctx.read_gpr(m))
                .wrapping_add(ctx.read_gpr(a));
            ctx.write_gpr(d, result);
        }

        Ok(())
    }

    pub fn mls<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MLS";

        let cond;
        let d;
        let n;
        let m;
        let a;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                a = (code & 0xF000) >> 12;

                reject!(
                    d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15 || a == 13 || a == 15,
                    NAME,
                    enc,
                    "UNPREDICTABLE"
                );
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx
                .read_gpr(a)
                .wrapping_sub(ctx.read_gpr(n).wrapping_mul(ctx.read_gpr(m)));
            ctx.write_gpr(d, result);
        }

        Ok(())
    }

    pub fn umull<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "UMULL";

        let (cond, d_lo, d_hi, n, m) = Armv7::decode_long_multiply(ctx, code, enc, NAME)?;

        if condition_passed(&ctx.apsr, cond) {
            let result = u64::from(ctx.read_gpr(n)) * u64::from(ctx.read_gpr(m));
            ctx.write_gpr(d_lo, result as u32);
            ctx.write_gpr(d_hi, (result >> 32) as u32);
        }

        Ok(())
    }

    pub fn umlal<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "UMLAL";

        let (cond, d_lo, d_hi, n, m) = Armv7::decode_long_multiply(ctx, code, enc, NAME)?;

        if condition_passed(&ctx.apsr, cond) {
            let acc = u64::from(ctx.read_gpr(d_hi)) << 32 | u64::from(ctx.read_gpr(d_lo));
            let result = (u64::from(ctx.read_gpr(n)) * u64::from(ctx.read_gpr(m))).wrapping_add(acc);
            ctx.write_gpr(d_lo, result as u32);
            ctx.write_gpr(d_hi, (result >> 32) as u32);
        }

        Ok(())
    }

    pub fn smull<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SMULL";

        let (cond, d_lo, d_hi, n, m) = Armv7::decode_long_multiply(ctx, code, enc, NAME)?;

        if condition_passed(&ctx.apsr, cond) {
            let result = i64::from(ctx.read_gpr(n) as i32) * i64::from(ctx.read_gpr(m) as i32);
            ctx.write_gpr(d_lo, result as u32);
            ctx.write_gpr(d_hi, (result >> 32) as u32);
        }

        Ok(())
    }

    pub fn smlal<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SMLAL";

        let (cond, d_lo, d_hi, n, m) = Armv7::decode_long_multiply(ctx, code, enc, NAME)?;

        if condition_passed(&ctx.apsr, cond) {
            let acc = (u64::from(ctx.read_gpr(d_hi)) << 32 | u64::from(ctx.read_gpr(d_lo))) as i64;
            let product = i64::from(ctx.read_gpr(n) as i32) * i64::from(ctx.read_gpr(m) as i32);
            let result = product.wrapping_add(acc) as u64;
            ctx.write_gpr(d_lo, result as u32);
            ctx.write_gpr(d_hi, (result >> 32) as u32);
        }

        Ok(())
    }

    fn decode_long_multiply(
        ctx: &mut Context,
        code: Code,
        enc: Encoding,
        name: &'static str,
    ) -> Result<(u32, u32, u32, u32, u32), crate::emulator::cpu::OpcodeError> {
        match enc {
            Encoding::T1 => {
                let cond = ctx.itstate.advance();
                let d_lo = (code & 0xF000) >> 12;
                let d_hi = (code & 0xF00) >> 8;
                let n = (code & 0xF_0000) >> 16;
                let m = code & 0xF;

                reject!(
                    d_lo == 13 || d_lo == 15 || d_hi == 13 || d_hi == 15 || n == 13 || n == 15 || m == 13 || m == 15,
                    name,
                    enc,
                    "UNPREDICTABLE"
                );
                reject!(d_lo == d_hi, name, enc, "UNPREDICTABLE");

                Ok((cond, d_lo, d_hi, n, m))
            }
            Encoding::A1 => Err(crate::emulator::cpu::OpcodeError::NotImplemented {
                mnemonic: name,
                encoding: enc,
            }),
            _ => Err(crate::emulator::cpu::OpcodeError::BadEncoding {
                mnemonic: name,
                encoding: enc,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::emulator::bus::testing::FlatBus;
    use crate::emulator::cpu::{Armv7, Context, Encoding, OpcodeError};

    fn ctx() -> Context {
        Context::new(1)
    }

    fn long_mul(d_lo: u32, d_hi: u32, n: u32, m: u32) -> u32 {
        n << 16 | d_lo << 12 | d_hi << 8 | m
    }

    #[test]
    fn muls_sets_n_and_z_outside_it_block() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 3);
        ctx.write_gpr(1, 0x6000_0000);

        // MULS R0, R1, R0
        Armv7::mul(&mut ctx, 0 | 1 << 3, Encoding::T1, &mut bus).unwrap();

        // 3 * 0x6000_0000 wraps to 0x2000_0000.
        assert_eq!(ctx.read_gpr(0), 0x2000_0000);
        assert!(!ctx.apsr.z);
        assert!(!ctx.apsr.n);
    }

    #[test]
    fn mul_inside_it_block_leaves_flags() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.apsr.z = true;
        ctx.itstate.write(0x08);
        ctx.write_gpr(0, 5);
        ctx.write_gpr(1, 7);

        Armv7::mul(&mut ctx, 0 | 1 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 35);
        assert!(ctx.apsr.z);
    }

    #[test]
    fn mla_and_mls_accumulate() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 6);
        ctx.write_gpr(2, 7);
        ctx.write_gpr(3, 100);

        // MLA R0, R1, R2, R3
        let code = 1 << 16 | 3 << 12 | 0 << 8 | 2;
        Armv7::mla(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 142);

        // MLS R4, R1, R2, R3
        let code = 1 << 16 | 3 << 12 | 4 << 8 | 2;
        Armv7::mls(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 58);
    }

    #[test]
    fn long_multiplies() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0xFFFF_FFFF);
        ctx.write_gpr(2, 2);

        // UMULL R4, R5, R1, R2: 0x1_FFFF_FFFE
        Armv7::umull(&mut ctx, long_mul(4, 5, 1, 2), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 0xFFFF_FFFE);
        assert_eq!(ctx.read_gpr(5), 1);

        // SMULL R6, R7, R1, R2: -1 * 2 = -2
        Armv7::smull(&mut ctx, long_mul(6, 7, 1, 2), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(6), 0xFFFF_FFFE);
        assert_eq!(ctx.read_gpr(7), 0xFFFF_FFFF);

        // UMLAL adds onto the 64-bit pair.
        ctx.write_gpr(8, 1);
        ctx.write_gpr(9, 0);
        ctx.write_gpr(10, 0xFFFF_FFFF);
        ctx.write_gpr(11, 1);
        Armv7::umlal(&mut ctx, long_mul(8, 9, 10, 11), Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(8), 0);
        assert_eq!(ctx.read_gpr(9), 1);
    }

    #[test]
    fn mla_with_pc_accumulator_is_mul() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        let code = 1 << 16 | 15 << 12 | 0 << 8 | 2;
        let err = Armv7::mla(&mut ctx, code, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { reason: "MUL", .. }));
    }
}
