//! Bitwise operations, the flag-only tests and the move family.
//!
//! Logical results update N, Z and the shifter carry on their flag-setting
//! forms; the overflow flag is never touched here.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::{
    condition_passed, thumb32_imm12, thumb32_imm16, thumb32_imm_shift, thumb_expand_imm_c, ShiftType,
};
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::registers::COND_AL;
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};
use crate::utils::BitOps;

impl Armv7 {
    pub fn and_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "AND_IMM";

        let mut carry = ctx.apsr.c;
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
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(d == 15 && set_flags, NAME, enc, "TST (immediate)");
                reject!(d == 13 || d == 15 || n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) & imm32;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn and_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "AND_REG";

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

                reject!(d == 15 && set_flags, NAME, enc, "TST (register)");
                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) & shifted;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn bic_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "BIC_IMM";

        let mut carry = ctx.apsr.c;
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
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(d == 13 || d == 15 || n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) & !imm32;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn bic_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "BIC_REG";

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
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) & !shifted;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn eor_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "EOR_IMM";

        let mut carry = ctx.apsr.c;
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
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(d == 15 && set_flags, NAME, enc, "TEQ (immediate)");
                reject!(d == 13 || d == 15 || n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) ^ imm32;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn eor_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "EOR_REG";

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

                reject!(d == 15 && set_flags, NAME, enc, "TEQ (register)");
                reject!(d == 13 || d == 15 || n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) ^ shifted;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn orr_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ORR_IMM";

        let mut carry = ctx.apsr.c;
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
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(n == 15, NAME, enc, "MOV (immediate)");
                reject!(d == 13 || d == 15 || n == 13, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) | imm32;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn orr_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ORR_REG";

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

                reject!(n == 15, NAME, enc, "MOV (register)");
                reject!(d == 13 || d == 15 || n == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) | shifted;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn orn_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ORN_IMM";

        let mut carry = ctx.apsr.c;
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
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(n == 15, NAME, enc, "MVN (immediate)");
                reject!(d == 13 || d == 15 || n == 13, NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) | !imm32;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn orn_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "ORN_REG";

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

                reject!(n == 15, NAME, enc, "MVN (register)");
                reject!(d == 13 || d == 15 || n == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) | !shifted;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn mvn_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MVN_IMM";

        let mut carry = ctx.apsr.c;
        let cond;
        let d;
        let set_flags;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                set_flags = code.check_bit(20);
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = !imm32;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn mvn_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MVN_REG";

        let mut set_flags = !ctx.itstate.active();
        let cond;
        let d;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = code & 0x7;
                m = (code & 0x38) >> 3;
                shift_t = ShiftType::LogicalLeft;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(d == 13 || d == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = !shifted;
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_logical_flags(result, carry);
            }
        }

        Ok(())
    }

    pub fn tst_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "TST_IMM";

        let mut carry = ctx.apsr.c;
        let cond;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) & imm32;
            ctx.set_logical_flags(result, carry);
        }

        Ok(())
    }

    pub fn tst_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "TST_REG";

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

                reject!(n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) & shifted;
            ctx.set_logical_flags(result, carry);
        }

        Ok(())
    }

    pub fn teq_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "TEQ_IMM";

        let mut carry = ctx.apsr.c;
        let cond;
        let n;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(n == 13 || n == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(n) ^ imm32;
            ctx.set_logical_flags(result, carry);
        }

        Ok(())
    }

    pub fn teq_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "TEQ_REG";

        let cond;
        let n;
        let m;
        let shift_t;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                let (ty, amount) = thumb32_imm_shift(code);
                shift_t = ty;
                shift_n = amount;

                reject!(n == 13 || n == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (shifted, carry) = shift_t.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let result = ctx.read_gpr(n) ^ shifted;
            ctx.set_logical_flags(result, carry);
        }

        Ok(())
    }

    pub fn mov_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MOV_IMM";

        let mut set_flags = !ctx.itstate.active();
        let mut carry = ctx.apsr.c;
        let cond;
        let d;
        let imm32;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code >> 8) & 0x7;
                imm32 = code & 0xFF;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                set_flags = code.check_bit(20);
                d = (code >> 8) & 0xF;
                let (value, c) = thumb_expand_imm_c(thumb32_imm12(code), carry);
                imm32 = value;
                carry = c;

                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                set_flags = false;
                d = (code >> 8) & 0xF;
                imm32 = thumb32_imm16(code);

                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            ctx.write_gpr(d, imm32);
            if set_flags {
                ctx.set_logical_flags(imm32, carry);
            }
        }

        Ok(())
    }

    pub fn mov_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MOV_REG";

        let cond;
        let d;
        let m;
        let set_flags;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0x80) >> 4 | (code & 0x7);
                m = (code & 0x78) >> 3;
                set_flags = false;

                reject!(d == 15 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                // The 16-bit flag-setting form is only valid outside an IT
                // block and carries no condition of its own.
                cond = COND_AL;
                d = code & 0x7;
                m = (code & 0x38) >> 3;
                set_flags = true;

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                m = code & 0xF;
                set_flags = code.check_bit(20);

                reject!((d == 13 || m == 13 || m == 15) && set_flags, NAME, enc, "UNPREDICTABLE");
                reject!((d == 13 && (m == 13 || m == 15)) || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let result = ctx.read_gpr(m);
            ctx.write_gpr(d, result);
            if set_flags {
                ctx.set_zero_and_sign(result);
            }
        }

        Ok(())
    }

    pub fn movt<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MOVT";

        let cond;
        let d;
        let imm16;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                d = (code & 0xF00) >> 8;
                imm16 = thumb32_imm16(code);

                reject!(d == 13 || d == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let low = ctx.read_gpr(d) & 0xFFFF;
            ctx.write_gpr(d, low | imm16 << 16);
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
    fn mov_then_cmp_leaves_equal_flags() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // MOV R0, #5 ; CMP R0, #5
        Armv7::mov_imm(&mut ctx, 5, Encoding::T1, &mut bus).unwrap();
        Armv7::cmp_imm(&mut ctx, 5, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 5);
        assert!(ctx.apsr.z);
        assert!(ctx.apsr.c);
        assert!(!ctx.apsr.n);
        assert!(!ctx.apsr.v);
    }

    #[test]
    fn mov_imm_t1_zero_extends() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // MOVS R0, #255 must not sign-extend.
        Armv7::mov_imm(&mut ctx, 0xFF, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0xFF);
        assert!(!ctx.apsr.n);
    }

    #[test]
    fn mov_imm_t2_updates_carry_from_expansion() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // MOVS R1, #0x80000000 (imm12 = 0x400: 0x80 rotated right by 8).
        let code = 0xF050_0000 | 1 << 8 | 0x4000;
        Armv7::mov_imm(&mut ctx, code, Encoding::T2, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(1), 0x8000_0000);
        assert!(ctx.apsr.c);
        assert!(ctx.apsr.n);
    }

    #[test]
    fn movw_movt_build_full_word() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // MOVW R4, #0xBEEF: imm4 = 0xB, i = 1, imm3 = 0b110, imm8 = 0xEF.
        let code = 0xF240_0000 | 0xB << 16 | 0x0400_0000 | 0x6000 | 4 << 8 | 0xEF;
        Armv7::mov_imm(&mut ctx, code, Encoding::T3, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 0xBEEF);

        // MOVT R4, #0xDEAD: imm4 = 0xD, i = 1, imm3 = 0b110, imm8 = 0xAD.
        let code = 0xF2C0_0000 | 0xD << 16 | 0x0400_0000 | 0x6000 | 4 << 8 | 0xAD;
        Armv7::movt(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 0xDEAD_BEEF);
    }

    #[test]
    fn and_reg_takes_carry_from_shifter() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, u32::MAX);
        ctx.write_gpr(1, 0x8000_0001);

        // ANDS R0, R0, R1, LSL #1: bit 31 of Rm goes to the carry.
        let code = 0xEA10_0000 | 0 << 16 | 0 << 8 | 0x40 | 1;
        Armv7::and_reg(&mut ctx, code, Encoding::T2, &mut bus).unwrap();

        assert_eq!(ctx.read_gpr(0), 2);
        assert!(ctx.apsr.c);
        assert!(!ctx.apsr.n);
    }

    #[test]
    fn bitwise_identities() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(2, 0b1100);
        ctx.write_gpr(3, 0b1010);

        // EORS R2, R3 (16-bit)
        Armv7::eor_reg(&mut ctx, 2 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0b0110);

        // ORRS R2, R3
        Armv7::orr_reg(&mut ctx, 2 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0b1110);

        // BICS R2, R3
        Armv7::bic_reg(&mut ctx, 2 | 3 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0b0100);

        // MVNS R5, R2
        Armv7::mvn_reg(&mut ctx, 5 | 2 << 3, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(5), !0b0100);
    }

    #[test]
    fn orn_complements_the_operand() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(1, 0xF0);

        // ORN R0, R1, #0xFF -> R1 | !0xFF
        let code = 0xF060_0000 | 1 << 16 | 0 << 8 | 0xFF;
        Armv7::orn_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0xFFFF_FFF0 | 0xF0);
    }

    #[test]
    fn tst_and_teq_only_touch_flags() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(0, 0x0F);
        ctx.write_gpr(1, 0xF0);

        // TST R0, R1: no overlap -> Z.
        Armv7::tst_reg(&mut ctx, 0 | 1 << 3, Encoding::T1, &mut bus).unwrap();
        assert!(ctx.apsr.z);
        assert_eq!(ctx.read_gpr(0), 0x0F);

        // TEQ R0, R0 -> Z.
        let code = 0xEA90_0000 | 0 << 16 | 0xF << 8 | 0;
        Armv7::teq_reg(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert!(ctx.apsr.z);
    }

    #[test]
    fn mov_reg_t2_rejected_inside_it_block() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.itstate.write(0x08);

        let err = Armv7::mov_reg(&mut ctx, 0, Encoding::T2, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));
    }

    #[test]
    fn orr_imm_with_pc_base_is_a_mov_alias() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        let code = 0xF040_0000 | 15 << 16 | 2 << 8 | 1;
        let err = Armv7::orr_imm(&mut ctx, code, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { reason: "MOV (immediate)", .. }));
    }
}
