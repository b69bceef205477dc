//! Register-file shift and rotate instructions. These are thin wrappers
//! around the barrel shifter; the immediate forms resolve their zero-amount
//! special cases during decode.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::{condition_passed, decode_imm_shift, thumb32_shift_amount, ShiftType};
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};
use crate::utils::BitOps;

impl Armv7 {
    pub fn lsl_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "LSL_IMM";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                m = (code & 0x38) >> 3;
                shift_n = (code & 0x7C0) >> 6;

                reject!(shift_n == 0, NAME, enc, "MOV (register)");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                shift_n = thumb32_shift_amount(code);

                reject!(shift_n == 0, NAME, enc, "MOV (register)");
                reject!(d == 13 || d == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_logical_flags(res, carry);
            }
        }

        Ok(())
    }

    pub fn lsl_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "LSL_REG";
        Armv7::shift_by_register(ctx, code, enc, NAME, ShiftType::LogicalLeft)
    }

    pub fn lsr_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "LSR_IMM";
        Armv7::shift_by_immediate(ctx, code, enc, NAME, ShiftType::LogicalRight)
    }

    pub fn lsr_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "LSR_REG";
        Armv7::shift_by_register(ctx, code, enc, NAME, ShiftType::LogicalRight)
    }

    pub fn asr_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ASR_IMM";
        Armv7::shift_by_immediate(ctx, code, enc, NAME, ShiftType::ArithRight)
    }

    pub fn asr_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ASR_REG";
        Armv7::shift_by_register(ctx, code, enc, NAME, ShiftType::ArithRight)
    }

    pub fn ror_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ROR_IMM";

        let cond;
        let d;
        let m;
        let set_flags;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                shift_n = thumb32_shift_amount(code);

                reject!(shift_n == 0, NAME, enc, "RRX");
                reject!(d == 13 || d == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry) = ShiftType::RotateRight.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_logical_flags(res, carry);
            }
        }

        Ok(())
    }

    pub fn ror_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ROR_REG";
        Armv7::shift_by_register(ctx, code, enc, NAME, ShiftType::RotateRight)
    }

    pub fn rrx<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "RRX";

        let cond;
        let d;
        let m;
        let set_flags;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);

                reject!(d == 13 || d == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry) = ShiftType::RotateRightExtend.perform_shift(ctx.read_gpr(m), 1, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_logical_flags(res, carry);
            }
        }

        Ok(())
    }

    /// Shared decode and effect for the LSR/ASR immediate forms, where a
    /// zero amount field encodes a shift by 32.
    fn shift_by_immediate(
        ctx: &mut Context,
        code: Code,
        enc: Encoding,
        name: &'static str,
        shift_t: ShiftType,
    ) -> ExecResult {
        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let m;
        let imm5;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                m = (code & 0x38) >> 3;
                imm5 = (code & 0x7C0) >> 6;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                imm5 = thumb32_shift_amount(code);

                reject!(d == 13 || d == 15 || m == 13 || m == 15, name, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(name, enc),
            _ => return bad_encoding(name, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (_, shift_n) = decode_imm_shift(shift_t as u32, imm5);
            let (res, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_logical_flags(res, carry);
            }
        }

        Ok(())
    }

    /// Shared decode and effect for the shift-by-register forms. Only the
    /// low byte of the shift register participates.
    fn shift_by_register(
        ctx: &mut Context,
        code: Code,
        enc: Encoding,
        name: &'static str,
        shift_t: ShiftType,
    ) -> ExecResult {
        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let m;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = d;
                m = (code & 0x38) >> 3;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = code.check_bit(20);

                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, name, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(name, enc),
            _ => return bad_encoding(name, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let amount = ctx.read_gpr(m) & 0xFF;
            let (res, carry) = shift_t.perform_shift(ctx.read_gpr(n), amount, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_logical_flags(res, carry);
            }
        }

        Ok(())
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
    fn lsl_imm_shifts_and_carries() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0xC000_0001);

        // LSLS R0, R1, #1
        Armv7::lsl_imm(&mut ctx, 1 << 6 | 1 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 0x8000_0002);
        assert!(ctx.apsr.c);
        assert!(ctx.apsr.n);
    }

    #[test]
    fn lsl_zero_amount_is_a_mov_alias() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        let err = Armv7::lsl_imm(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { reason: "MOV (register)", .. }));
    }

    #[test]
    fn lsr_imm_zero_field_means_thirty_two() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0x8000_0000);

        // LSRS R0, R1, #32 (imm5 = 0)
        Armv7::lsr_imm(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 0);
        assert!(ctx.apsr.c);
        assert!(ctx.apsr.z);
    }

    #[test]
    fn asr_imm_sign_fills() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0x8000_0000);

        // ASRS R0, R1, #32 (imm5 = 0)
        Armv7::asr_imm(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), u32::MAX);
        assert!(ctx.apsr.c);
        assert!(ctx.apsr.n);
    }

    #[test]
    fn shift_by_register_uses_low_byte_only() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 0xFF);
        ctx.write_gpr(1, 0x0000_0104); // low byte 4

        // LSLS R0, R1 (16-bit, Rdn = R0, Rm = R1)
        Armv7::lsl_reg(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0xFF0);

        // Amounts over 32 drain to zero with a clear carry.
        ctx.write_gpr(2, 0xFFFF_FFFF);
        ctx.write_gpr(3, 40);
        Armv7::lsr_reg(&mut ctx, 2 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0);
        assert!(!ctx.apsr.c);
        assert!(ctx.apsr.z);
    }

    #[test]
    fn ror_and_rrx() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0x0000_000F);

        // ROR R0, R1, #4 (32-bit immediate form)
        let code = 0xEA4F_0030 | 0 << 8 | 0x1000 | 1;
        Armv7::ror_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0xF000_0000);

        // RRX R2, R1 with carry set.
        ctx.apsr.c = true;
        let code = 0xEA4F_0030 | 2 << 8 | 1;
        Armv7::rrx(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0x8000_0007);
    }

    #[test]
    fn shifts_inside_it_block_do_not_set_flags() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.apsr.z = true;
        ctx.itstate.write(0x08); // IT EQ
        ctx.write_gpr(1, 0x8000_0000);

        // LSR R0, R1, #1 executes but leaves Z alone.
        Armv7::lsr_imm(&mut ctx, 1 << 6 | 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0x4000_0000);
        assert!(ctx.apsr.z);
    }
}
