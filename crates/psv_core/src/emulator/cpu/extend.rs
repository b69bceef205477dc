//! Zero/sign extension, byte reversal and count-leading-zeros.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::condition_passed;
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject, OpcodeError};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};

/// Extract `(d, m, rotation)` for the extend family: the 16-bit form has no
/// rotation, the 32-bit form rotates the source by 0/8/16/24 bits first.
fn decode_extend(
    ctx: &mut Context,
    code: Code,
    enc: Encoding,
    name: &'static str,
) -> Result<(u32, u32, u32, u32), OpcodeError> {
    match enc {
        Encoding::T1 => {
            let cond = ctx.itstate.advance();
            Ok((cond, code & 0x7, (code & 0x38) >> 3, 0))
        }
        Encoding::T2 => {
            let cond = ctx.itstate.advance();
            let d = (code & 0xF00) >> 8;
            let m = code & 0xF;
            let rot = (code & 0x30) >> 1;

            if d == 13 || d == 15 || m == 13 || m == 15 {
                return Err(OpcodeError::Rejected {
                    mnemonic: name,
                    encoding: enc,
                    predicate: "d == 13 || d == 15 || m == 13 || m == 15",
                    reason: "UNPREDICTABLE",
                });
            }

            Ok((cond, d, m, rot))
        }
        Encoding::A1 => Err(OpcodeError::NotImplemented {
            mnemonic: name,
            encoding: enc,
        }),
        _ => Err(OpcodeError::BadEncoding {
            mnemonic: name,
            encoding: enc,
        }),
    }
}

impl Armv7 {
    pub fn uxtb<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m, rot) = decode_extend(ctx, code, enc, "UXTB")?;

        if condition_passed(&ctx.apsr, cond) {
            let rotated = ctx.read_gpr(m).rotate_right(rot);
            ctx.write_gpr(d, rotated & 0xFF);
        }

        Ok(())
    }

    pub fn uxth<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m, rot) = decode_extend(ctx, code, enc, "UXTH")?;

        if condition_passed(&ctx.apsr, cond) {
            let rotated = ctx.read_gpr(m).rotate_right(rot);
            ctx.write_gpr(d, rotated & 0xFFFF);
        }

        Ok(())
    }

    pub fn sxtb<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m, rot) = decode_extend(ctx, code, enc, "SXTB")?;

        if condition_passed(&ctx.apsr, cond) {
            let rotated = ctx.read_gpr(m).rotate_right(rot);
            ctx.write_gpr(d, rotated as u8 as i8 as i32 as u32);
        }

        Ok(())
    }

    pub fn sxth<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m, rot) = decode_extend(ctx, code, enc, "SXTH")?;

        if condition_passed(&ctx.apsr, cond) {
            let rotated = ctx.read_gpr(m).rotate_right(rot);
            ctx.write_gpr(d, rotated as u16 as i16 as i32 as u32);
        }

        Ok(())
    }

    pub fn rev<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m) = Armv7::decode_rev(ctx, code, enc, "REV")?;

        if condition_passed(&ctx.apsr, cond) {
            let value = ctx.read_gpr(m);
            ctx.write_gpr(d, value.swap_bytes());
        }

        Ok(())
    }

    pub fn rev16<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m) = Armv7::decode_rev(ctx, code, enc, "REV16")?;

        if condition_passed(&ctx.apsr, cond) {
            let value = ctx.read_gpr(m);
            let result = (value & 0xFF00_FF00) >> 8 | (value & 0x00FF_00FF) << 8;
            ctx.write_gpr(d, result);
        }

        Ok(())
    }

    pub fn revsh<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        let (cond, d, m) = Armv7::decode_rev(ctx, code, enc, "REVSH")?;

        if condition_passed(&ctx.apsr, cond) {
            let value = ctx.read_gpr(m);
            let swapped = (value & 0xFF) << 8 | (value >> 8) & 0xFF;
            ctx.write_gpr(d, swapped as u16 as i16 as i32 as u32);
        }

        Ok(())
    }

    pub fn clz<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "CLZ";

        let cond;
        let d;
        let m;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;

                reject!((code & 0xF_0000) >> 16 != m, NAME, enc, "UNPREDICTABLE");
                reject!(d == 13 || d == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let count = ctx.read_gpr(m).leading_zeros();
            ctx.write_gpr(d, count);
        }

        Ok(())
    }

    /// Decode shared by the byte-reverse family: 16-bit `ddd mmm` form and
    /// the 32-bit form where the source register appears twice.
    fn decode_rev(
        ctx: &mut Context,
        code: Code,
        enc: Encoding,
        name: &'static str,
    ) -> Result<(u32, u32, u32), OpcodeError> {
        match enc {
            Encoding::T1 => {
                let cond = ctx.itstate.advance();
                Ok((cond, code & 0x7, (code & 0x38) >> 3))
            }
            Encoding::T2 => {
                let cond = ctx.itstate.advance();
                let d = (code & 0xF00) >> 8;
                let m = code & 0xF;

                if (code & 0xF_0000) >> 16 != m || d == 13 || d == 15 || m == 13 || m == 15 {
                    return Err(OpcodeError::Rejected {
                        mnemonic: name,
                        encoding: enc,
                        predicate: "m2 != m || d == 13 || d == 15 || m == 13 || m == 15",
                        reason: "UNPREDICTABLE",
                    });
                }

                Ok((cond, d, m))
            }
            Encoding::A1 => Err(OpcodeError::NotImplemented {
                mnemonic: name,
                encoding: enc,
            }),
            _ => Err(OpcodeError::BadEncoding {
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

    #[test]
    fn byte_and_half_extends() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0xFFFF_FF80);

        // UXTB R0, R1
        Armv7::uxtb(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0x80);

        // SXTB R2, R1
        Armv7::sxtb(&mut ctx, 2 | 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0xFFFF_FF80);

        ctx.write_gpr(3, 0x0001_8000);
        // UXTH R4, R3
        Armv7::uxth(&mut ctx, 4 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 0x8000);

        // SXTH R5, R3
        Armv7::sxth(&mut ctx, 5 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(5), 0xFFFF_8000);
    }

    #[test]
    fn rotated_extend() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0x00AB_0000);

        // UXTB R0, R1, ROR #16
        let code = 0xFA5F_F080 | 0 << 8 | 0x20 | 1;
        Armv7::uxtb(&mut ctx, code, Encoding::T2, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0xAB);
    }

    #[test]
    fn byte_reversal_family() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0x1122_3344);

        Armv7::rev(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0x4433_2211);

        Armv7::rev16(&mut ctx, 2 | 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0x2211_4433);

        ctx.write_gpr(3, 0x0000_80FF);
        Armv7::revsh(&mut ctx, 4 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 0xFFFF_FF80);
    }

    #[test]
    fn clz_counts() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0x0001_0000);

        let code = 0xFAB0_F080 | 1 << 16 | 0 << 8 | 1;
        Armv7::clz(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 15);

        ctx.write_gpr(2, 0);
        let code = 0xFAB0_F080 | 2 << 16 | 3 << 8 | 2;
        Armv7::clz(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(3), 32);
    }

    #[test]
    fn clz_mismatched_source_fields_reject() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        let code = 0xFAB0_F080 | 5 << 16 | 0 << 8 | 1;
        let err = Armv7::clz(&mut ctx, code, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));
    }
}
