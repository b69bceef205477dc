//! Single and dual load/store instructions.
//!
//! All addressing forms reduce to the same three modifiers: `index` selects
//! whether the offset participates in the access address, `add` its sign,
//! and `wback` whether the offset address is written back to the base
//! register. Loads extend to 32 bits according to their size suffix.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::{condition_passed, ShiftType};
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};
use crate::utils::BitOps;

#[inline]
fn offset_address(base: u32, offset: u32, add: bool) -> u32 {
    if add {
        base.wrapping_add(offset)
    } else {
        base.wrapping_sub(offset)
    }
}

impl Armv7 {
    pub fn ldr_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDR_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x7C0) >> 4;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0x700) >> 8;
                n = 13;
                imm32 = (code & 0xFF) << 2;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(n == 15, NAME, enc, "LDR (literal)");
                reject!(t == 15 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T4 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(n == 15, NAME, enc, "LDR (literal)");
                reject!(index && add && !wback, NAME, enc, "LDRT");
                reject!(n == 13 && !index && add && wback && imm32 == 4, NAME, enc, "POP");
                reject!(!index && !wback, NAME, enc, "UNDEFINED");
                reject!((wback && n == t) || (t == 15 && ctx.itstate.active()), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let data = bus.read_32(addr);
            ctx.write_gpr(t, data);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn ldr_lit<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDR_LIT";

        let cond;
        let t;
        let imm32;
        let add;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = (code & 0x700) >> 8;
                imm32 = (code & 0xFF) << 2;
                add = true;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                imm32 = code & 0xFFF;
                add = code.check_bit(23);

                reject!(t == 15 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let base = ctx.pc.wrapping_add(4) & !3;
            let addr = offset_address(base, imm32, add);
            let data = bus.read_32(addr);
            ctx.write_gpr(t, data);
        }

        Ok(())
    }

    pub fn ldr_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDR_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(n == 15, NAME, enc, "LDR (literal)");
                reject!(m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
                reject!(t == 15 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            let data = bus.read_32(addr);
            ctx.write_gpr(t, data);
        }

        Ok(())
    }

    pub fn ldrb_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRB_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x7C0) >> 6;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(t == 15, NAME, enc, "PLD");
                reject!(n == 15, NAME, enc, "LDRB (literal)");
                reject!(t == 13, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(n == 15, NAME, enc, "LDRB (literal)");
                reject!(t == 15 && index && !add && !wback, NAME, enc, "PLD");
                reject!(index && add && !wback, NAME, enc, "LDRBT");
                reject!(!index && !wback, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let data = u32::from(bus.read_8(addr));
            ctx.write_gpr(t, data);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn ldrb_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRB_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(t == 15, NAME, enc, "PLD");
                reject!(n == 15, NAME, enc, "LDRB (literal)");
                reject!(t == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            let data = u32::from(bus.read_8(addr));
            ctx.write_gpr(t, data);
        }

        Ok(())
    }

    pub fn ldrh_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRH_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x7C0) >> 5;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(t == 15, NAME, enc, "PLD");
                reject!(n == 15, NAME, enc, "LDRH (literal)");
                reject!(t == 13, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(n == 15, NAME, enc, "LDRH (literal)");
                reject!(index && add && !wback, NAME, enc, "LDRHT");
                reject!(!index && !wback, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let data = u32::from(bus.read_16(addr));
            ctx.write_gpr(t, data);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn ldrh_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRH_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(t == 15, NAME, enc, "PLD");
                reject!(n == 15, NAME, enc, "LDRH (literal)");
                reject!(t == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            let data = u32::from(bus.read_16(addr));
            ctx.write_gpr(t, data);
        }

        Ok(())
    }

    pub fn ldrsb_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRSB_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(t == 15, NAME, enc, "PLI");
                reject!(n == 15, NAME, enc, "LDRSB (literal)");
                reject!(t == 13, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(n == 15, NAME, enc, "LDRSB (literal)");
                reject!(t == 15 && index && !add && !wback, NAME, enc, "PLI");
                reject!(index && add && !wback, NAME, enc, "LDRSBT");
                reject!(!index && !wback, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let data = bus.read_8(addr) as i8 as i32 as u32;
            ctx.write_gpr(t, data);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn ldrsb_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRSB_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(t == 15, NAME, enc, "PLI");
                reject!(n == 15, NAME, enc, "LDRSB (literal)");
                reject!(t == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            let data = bus.read_8(addr) as i8 as i32 as u32;
            ctx.write_gpr(t, data);
        }

        Ok(())
    }

    pub fn ldrsh_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRSH_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(t == 15, NAME, enc, "Related instructions");
                reject!(n == 15, NAME, enc, "LDRSH (literal)");
                reject!(t == 13, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(n == 15, NAME, enc, "LDRSH (literal)");
                reject!(index && add && !wback, NAME, enc, "LDRSHT");
                reject!(!index && !wback, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let data = bus.read_16(addr) as i16 as i32 as u32;
            ctx.write_gpr(t, data);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn ldrsh_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRSH_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(t == 15, NAME, enc, "Related instructions");
                reject!(n == 15, NAME, enc, "LDRSH (literal)");
                reject!(t == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            let data = bus.read_16(addr) as i16 as i32 as u32;
            ctx.write_gpr(t, data);
        }

        Ok(())
    }

    pub fn ldrd_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDRD_IMM";

        let cond;
        let t;
        let t2;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                t2 = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                imm32 = (code & 0xFF) << 2;
                index = code.check_bit(24);
                add = code.check_bit(23);
                wback = code.check_bit(21);

                reject!(!index && !wback, NAME, enc, "Related encodings");
                reject!(n == 15, NAME, enc, "LDRD (literal)");
                reject!(wback && (n == t || n == t2), NAME, enc, "UNPREDICTABLE");
                reject!(t == 13 || t == 15 || t2 == 13 || t2 == 15 || t == t2, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let value = bus.read_64(addr);
            ctx.write_gpr(t, value as u32);
            ctx.write_gpr(t2, (value >> 32) as u32);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn str_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STR_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x7C0) >> 4;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0x700) >> 8;
                n = 13;
                imm32 = (code & 0xFF) << 2;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(n == 15, NAME, enc, "UNDEFINED");
                reject!(t == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T4 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(index && add && !wback, NAME, enc, "STRT");
                reject!(n == 13 && index && !add && wback && imm32 == 4, NAME, enc, "PUSH");
                reject!(n == 15 || (!index && !wback), NAME, enc, "UNDEFINED");
                reject!(t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            bus.write_32(addr, ctx.read_gpr(t));

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn str_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STR_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(n == 15, NAME, enc, "UNDEFINED");
                reject!(t == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            bus.write_32(addr, ctx.read_gpr(t));
        }

        Ok(())
    }

    pub fn strb_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STRB_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x7C0) >> 6;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(n == 15, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(index && add && !wback, NAME, enc, "STRBT");
                reject!(n == 15 || (!index && !wback), NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            bus.write_8(addr, ctx.read_gpr(t) as u8);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn strb_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STRB_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(n == 15, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            bus.write_8(addr, ctx.read_gpr(t) as u8);
        }

        Ok(())
    }

    pub fn strh_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STRH_IMM";

        let cond;
        let t;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                imm32 = (code & 0x7C0) >> 5;
                index = true;
                add = true;
                wback = false;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFFF;
                index = true;
                add = true;
                wback = false;

                reject!(n == 15, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                imm32 = code & 0xFF;
                index = code.check_bit(10);
                add = code.check_bit(9);
                wback = code.check_bit(8);

                reject!(index && add && !wback, NAME, enc, "STRHT");
                reject!(n == 15 || (!index && !wback), NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || (wback && n == t), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            bus.write_16(addr, ctx.read_gpr(t) as u16);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }

    pub fn strh_reg<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STRH_REG";

        let cond;
        let t;
        let n;
        let m;
        let shift_n;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = code & 0x7;
                n = (code & 0x38) >> 3;
                m = (code & 0x1C0) >> 6;
                shift_n = 0;
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                shift_n = (code & 0x30) >> 4;

                reject!(n == 15, NAME, enc, "UNDEFINED");
                reject!(t == 13 || t == 15 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let (offset, _) = ShiftType::LogicalLeft.perform_shift(ctx.read_gpr(m), shift_n, ctx.apsr.c);
            let addr = ctx.read_gpr(n).wrapping_add(offset);
            bus.write_16(addr, ctx.read_gpr(t) as u16);
        }

        Ok(())
    }

    pub fn strd_imm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STRD_IMM";

        let cond;
        let t;
        let t2;
        let n;
        let imm32;
        let index;
        let add;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                t2 = (code & 0xF00) >> 8;
                n = (code & 0xF_0000) >> 16;
                imm32 = (code & 0xFF) << 2;
                index = code.check_bit(24);
                add = code.check_bit(23);
                wback = code.check_bit(21);

                reject!(!index && !wback, NAME, enc, "Related encodings");
                reject!(wback && (n == t || n == t2), NAME, enc, "UNPREDICTABLE");
                reject!(n == 15 || t == 13 || t == 15 || t2 == 13 || t2 == 15, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let offset_addr = offset_address(ctx.read_gpr(n), imm32, add);
            let addr = if index { offset_addr } else { ctx.read_gpr(n) };

            let value = u64::from(ctx.read_gpr(t2)) << 32 | u64::from(ctx.read_gpr(t));
            bus.write_64(addr, value);

            if wback {
                ctx.write_gpr(n, offset_addr);
            }
        }

        Ok(())
    }
}
