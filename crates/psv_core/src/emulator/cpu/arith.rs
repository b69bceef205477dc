//! Add/subtract family, with-carry variants and the compares.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::{
    add_with_carry, condition_passed, thumb32_imm12, thumb32_imm_shift, thumb_expand_imm, ShiftType,
};
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};
use crate::utils::BitOps;

impl Armv7 {
    pub fn add_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADD_IMM";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x1C0) >> 6;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0x700) >> 8;
                n = d;
                imm32 = code & 0xFF;
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 15 && set_flags, NAME, enc, "CMN (immediate)");
                reject!(n == 13, NAME, enc, "ADD (SP plus immediate)");
                reject!(d == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T4 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = false;
                imm32 = thumb32_imm12(code);

                reject!(n == 15, NAME, enc, "ADR");
                reject!(n == 13, NAME, enc, "ADD (SP plus immediate)");
                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            if set_flags {
                let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), imm32, false);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, ctx.read_gpr(n).wrapping_add(imm32));
            }
        }

        Ok(())
    }

    pub fn add_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADD_REG";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0x80) >> 4 | (code & 0x7);
                n = d;
                m = (code & 0x78) >> 3;
                set_flags = false;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;

                reject!(n == 13 || m == 13, NAME, enc, "ADD (SP plus register)");
                reject!(n == 15 && m == 15, NAME, enc, "UNPREDICTABLE");
                reject!(d == 15 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(d == 15 && set_flags, NAME, enc, "CMN (register)");
                reject!(n == 13, NAME, enc, "ADD (SP plus register)");
                reject!(d == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            if set_flags {
                let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), shifted, false);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, ctx.read_gpr(n).wrapping_add(shifted));
            }
        }

        Ok(())
    }

    pub fn add_spi<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADD_SPI";

        let cond;
        let d;
        let set_flags;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0x700) >> 8;
                set_flags = false;
                imm32 = (code & 0xFF) << 2;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = 13;
                set_flags = false;
                imm32 = (code & 0x7F) << 2;
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 15 && set_flags, NAME, enc, "CMN (immediate)");
                reject!(d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T4 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                set_flags = false;
                imm32 = thumb32_imm12(code);

                reject!(d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            if set_flags {
                let (res, carry, overflow) = add_with_carry(ctx.sp(), imm32, false);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, ctx.sp().wrapping_add(imm32));
            }
        }

        Ok(())
    }

    pub fn add_spr<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADD_SPR";

        let cond;
        let d;
        let m;
        let set_flags;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0x80) >> 4 | (code & 0x7);
                m = d;
                set_flags = false;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = 13;
                m = (code & 0x78) >> 3;
                set_flags = false;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;

                reject!(m == 13, NAME, enc, "encoding T1");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(
                    d == 13 && (shift_t != ShiftType::LogicalLeft || shift_n > 3),
                    NAME,
                    enc,
                    "UNPREDICTABLE"
                );
                reject!(d == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let sp = ctx.sp();
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            if set_flags {
                let (res, carry, overflow) = add_with_carry(sp, shifted, false);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, sp.wrapping_add(shifted));
            }
        }

        Ok(())
    }

    pub fn adr<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADR";

        let cond;
        let d;
        let imm32;
        let add;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0x700) >> 8;
                imm32 = (code & 0xFF) << 2;
                add = true;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                imm32 = thumb32_imm12(code);
                add = false;

                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                imm32 = thumb32_imm12(code);
                add = true;

                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let base = ctx.pc.wrapping_add(4) & !3;
            let res = if add {
                base.wrapping_add(imm32)
            } else {
                base.wrapping_sub(imm32)
            };
            ctx.write_gpr(d, res);
        }

        Ok(())
    }

    pub fn sub_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SUB_IMM";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x1C0) >> 6;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0x700) >> 8;
                n = d;
                imm32 = code & 0xFF;
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 15 && set_flags, NAME, enc, "CMP (immediate)");
                reject!(n == 13, NAME, enc, "SUB (SP minus immediate)");
                reject!(d == 13 || d == 15 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T4 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = false;
                imm32 = thumb32_imm12(code);

                reject!(n == 15, NAME, enc, "ADR");
                reject!(n == 13, NAME, enc, "SUB (SP minus immediate)");
                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            if set_flags {
                let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), !imm32, true);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, ctx.read_gpr(n).wrapping_sub(imm32));
            }
        }

        Ok(())
    }

    pub fn sub_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SUB_REG";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(d == 15 && set_flags, NAME, enc, "CMP (register)");
                reject!(n == 13, NAME, enc, "SUB (SP minus register)");
                reject!(d == 13 || d == 15 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            if set_flags {
                let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), !shifted, true);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, ctx.read_gpr(n).wrapping_sub(shifted));
            }
        }

        Ok(())
    }

    pub fn sub_spi<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SUB_SPI";

        let cond;
        let d;
        let set_flags;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = 13;
                set_flags = false;
                imm32 = (code & 0x7F) << 2;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 15 && set_flags, NAME, enc, "CMP (immediate)");
                reject!(d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                set_flags = false;
                imm32 = thumb32_imm12(code);

                reject!(d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            if set_flags {
                let (res, carry, overflow) = add_with_carry(ctx.sp(), !imm32, true);
                ctx.write_gpr(d, res);
                ctx.set_arithmetic_flags(res, carry, overflow);
            } else {
                ctx.write_gpr(d, ctx.sp().wrapping_sub(imm32));
            }
        }

        Ok(())
    }

    pub fn rsb_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "RSB_IMM";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 13 || d == 15 || n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry, overflow) = add_with_carry(!ctx.read_gpr(n), imm32, true);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_arithmetic_flags(res, carry, overflow);
            }
        }

        Ok(())
    }

    pub fn rsb_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "RSB_REG";

        let cond;
        let d;
        let n;
        let m;
        let set_flags;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let (res, carry, overflow) = add_with_carry(!ctx.read_gpr(n), shifted, true);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_arithmetic_flags(res, carry, overflow);
            }
        }

        Ok(())
    }

    pub fn adc_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADC_IMM";

        let cond;
        let d;
        let n;
        let set_flags;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 13 || d == 15 || n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), imm32, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_arithmetic_flags(res, carry, overflow);
            }
        }

        Ok(())
    }

    pub fn adc_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ADC_REG";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = d;
                m = (code & 0x38) >> 3;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), shifted, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_arithmetic_flags(res, carry, overflow);
            }
        }

        Ok(())
    }

    pub fn sbc_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SBC_IMM";

        let cond;
        let d;
        let n;
        let set_flags;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                set_flags = code.check_bit(20);
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(d == 13 || d == 15 || n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), !imm32, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_arithmetic_flags(res, carry, overflow);
            }
        }

        Ok(())
    }

    pub fn sbc_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "SBC_REG";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                n = d;
                m = (code & 0x38) >> 3;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), !shifted, ctx.apsr.c);
            ctx.write_gpr(d, res);
            if set_flags {
                ctx.set_arithmetic_flags(res, carry, overflow);
            }
        }

        Ok(())
    }

    pub fn cmp_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "CMP_IMM";

        let cond;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0x700) >> 8;
                imm32 = code & 0xFF;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), !imm32, true);
            ctx.set_arithmetic_flags(res, carry, overflow);
        }

        Ok(())
    }

    pub fn cmp_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "CMP_REG";

        let cond;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = code & 0x7;
                m = (code & 0x38) >> 3;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                n = (code & 0x80) >> 4 | (code & 0x7);
                m = (code & 0x78) >> 3;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;

                reject!(n < 8 && m < 8, NAME, enc, "UNPREDICTABLE");
                reject!(n == 15 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), !shifted, true);
            ctx.set_arithmetic_flags(res, carry, overflow);
        }

        Ok(())
    }

    pub fn cmn_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "CMN_IMM";

        let cond;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                imm32 = thumb_expand_imm(ctx, thumb32_imm12(code));

                reject!(n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), imm32, false);
            ctx.set_arithmetic_flags(res, carry, overflow);
        }

        Ok(())
    }

    pub fn cmn_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "CMN_REG";

        let cond;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = code & 0x7;
                m = (code & 0x38) >> 3;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, _) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let (res, carry, overflow) = add_with_carry(ctx.read_gpr(n), shifted, false);
            ctx.set_arithmetic_flags(res, carry, overflow);
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

    // ADDS.W Rd, Rn, Rm
    fn adds_w(d: u32, n: u32, m: u32) -> u32 {
        0xEB10_0000 | n << 16 | d << 8 | m
    }

    #[test]
    fn adds_unsigned_wraparound_sets_carry_and_zero() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 0xFFFF_FFFF);
        ctx.write_gpr(1, 1);

        Armv7::add_reg(&mut ctx, adds_w(2, 0, 1), Encoding::T3, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(2), 0);
        assert!(!ctx.apsr.n);
        assert!(ctx.apsr.z);
        assert!(ctx.apsr.c);
        assert!(!ctx.apsr.v);
    }

    #[test]
    fn adds_signed_overflow_sets_v_and_n() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 0x7FFF_FFFF);
        ctx.write_gpr(1, 1);

        Armv7::add_reg(&mut ctx, adds_w(2, 0, 1), Encoding::T3, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(2), 0x8000_0000);
        assert!(ctx.apsr.n);
        assert!(!ctx.apsr.z);
        assert!(!ctx.apsr.c);
        assert!(ctx.apsr.v);
    }

    #[test]
    fn add_imm_t1_sets_flags_outside_it_block() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 7);

        // ADDS R0, R1, #2
        let code = 2 << 6 | 1 << 3;
        Armv7::add_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 9);
        assert!(!ctx.apsr.z);
        assert!(!ctx.apsr.n);
    }

    #[test]
    fn add_imm_t1_keeps_flags_inside_it_block() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.apsr.z = true;
        ctx.apsr.c = true;
        ctx.itstate.write(0x08); // IT EQ, one slot

        ctx.write_gpr(1, 0xFFFF_FFFF);
        let code = 1 << 6 | 1 << 3;
        Armv7::add_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();

        // Executed (Z was set) but the flags are untouched.
        assert_eq!(ctx.read_gpr(0), 0);
        assert!(ctx.apsr.z);
        assert!(ctx.apsr.c);
        assert!(!ctx.itstate.active());
    }

    #[test]
    fn condition_failure_commits_nothing() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.itstate.write(0x08); // IT EQ with Z clear: skip
        ctx.write_gpr(1, 5);

        let code = 2 << 6 | 1 << 3;
        Armv7::add_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 0);
    }

    #[test]
    fn add_imm_t3_rejects_sp_base() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // Rn = 13 belongs to the SP-relative form.
        let code = 0xF110_0000 | 13 << 16 | 2 << 8 | 1;
        let err = Armv7::add_imm(&mut ctx, code, Encoding::T3, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { reason: "ADD (SP plus immediate)", .. }));
    }

    #[test]
    fn sp_relative_add_and_sub() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.set_sp(0x1000);

        // ADD R1, SP, #16
        Armv7::add_spi(&mut ctx, 1 << 8 | 4, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(1), 0x1010);

        // SUB SP, SP, #32
        Armv7::sub_spi(&mut ctx, 8, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.sp(), 0xFE0);

        // ADD SP, SP, #32
        Armv7::add_spi(&mut ctx, 8, Encoding::T2, &mut bus).unwrap();
        assert_eq!(ctx.sp(), 0x1000);
    }

    #[test]
    fn adr_aligns_pc_before_adding() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.pc = 0x8000_0102;

        // ADR R3, #+16
        Armv7::adr(&mut ctx, 3 << 8 | 4, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(3), 0x8000_0114);
    }

    #[test]
    fn cmp_imm_equal_sets_z_and_c() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 5);

        // CMP R0, #5
        Armv7::cmp_imm(&mut ctx, 5, Encoding::T1, &mut bus).unwrap();

        assert!(ctx.apsr.z);
        assert!(ctx.apsr.c);
        assert!(!ctx.apsr.n);
        assert!(!ctx.apsr.v);
    }

    #[test]
    fn cmp_reg_unsigned_below_clears_c() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 4);
        ctx.write_gpr(1, 9);

        // CMP R0, R1
        Armv7::cmp_reg(&mut ctx, 1 << 3, Encoding::T1, &mut bus).unwrap();

        assert!(!ctx.apsr.z);
        assert!(!ctx.apsr.c);
        assert!(ctx.apsr.n);
    }

    #[test]
    fn rsb_negates() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(3, 7);

        // RSBS R2, R3, #0
        Armv7::rsb_imm(&mut ctx, 2 | 3 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(2), 7u32.wrapping_neg());
        assert!(ctx.apsr.n);
        assert!(!ctx.apsr.c);
    }

    #[test]
    fn adc_and_sbc_chain_through_carry() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // 64-bit add of 0x0000_0001_FFFF_FFFF + 1 done as two words.
        ctx.write_gpr(0, 0xFFFF_FFFF); // low
        ctx.write_gpr(1, 1); // high
        ctx.write_gpr(2, 1);

        // ADDS R0, R0, R2 (T3, flag-setting)
        Armv7::add_reg(&mut ctx, adds_w(0, 0, 2), Encoding::T3, &mut bus).unwrap();
        // ADCS R1, R1, #0: 0xF150_0000 form.
        let code = 0xF150_0000 | 1 << 16 | 1 << 8;
        Armv7::adc_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 0);
        assert_eq!(ctx.read_gpr(1), 2);

        // SBCS reverses it: subtract with borrow produced by SUBS.
        ctx.write_gpr(4, 0);
        ctx.write_gpr(5, 2);
        ctx.write_gpr(6, 1);
        // SUBS R4, R4, #1
        Armv7::sub_imm(&mut ctx, 4 << 8 | 1, Encoding::T2, &mut bus).unwrap();
        // SBCS R5, R5, #0
        let code = 0xF170_0000 | 5 << 16 | 5 << 8;
        Armv7::sbc_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(4), 0xFFFF_FFFF);
        assert_eq!(ctx.read_gpr(5), 1);
    }

    #[test]
    fn a1_forms_are_not_implemented() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        let err = Armv7::add_imm(&mut ctx, 0, Encoding::A1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::NotImplemented { .. }));

        let err = Armv7::cmp_reg(&mut ctx, 0, Encoding::A2, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::BadEncoding { .. }));
    }
}
