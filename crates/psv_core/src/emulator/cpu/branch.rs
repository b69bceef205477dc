//! Branches, calls and interworking.
//!
//! Branch targets are computed from the address of the current instruction
//! with the architectural "PC reads four ahead" offset folded into the
//! immediate. The actual transfer happens when the dispatcher consumes the
//! pending branch from the context.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::condition_passed;
use crate::emulator::cpu::error::{bad_encoding, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};
use crate::utils::{sign_extend32, BitOps};

impl Armv7 {
    pub fn b<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "B";

        let cond;
        let jump;

        match enc {
            Encoding::T1 => {
                cond = (code >> 8) & 0xF;
                jump = 4 + sign_extend32((code & 0xFF) << 1, 9);

                reject!(cond == 14, NAME, enc, "UNDEFINED");
                reject!(cond == 15, NAME, enc, "SVC");
                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                jump = 4 + sign_extend32((code & 0x7FF) << 1, 12);

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = (code >> 22) & 0xF;
                let s = (code >> 26) & 0x1;
                let j1 = (code >> 13) & 0x1;
                let j2 = (code >> 11) & 0x1;
                jump = 4 + sign_extend32(
                    s << 20 | j2 << 19 | j1 << 18 | (code & 0x3F_0000) >> 4 | (code & 0x7FF) << 1,
                    21,
                );

                reject!(cond >= 14, NAME, enc, "Related encodings");
                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T4 => {
                cond = ctx.itstate.advance();
                let s = (code >> 26) & 0x1;
                let i1 = (code >> 13) & 0x1 ^ s ^ 1;
                let i2 = (code >> 11) & 0x1 ^ s ^ 1;
                jump = 4 + sign_extend32(
                    s << 24 | i2 << 23 | i1 << 22 | (code & 0x3FF_0000) >> 4 | (code & 0x7FF) << 1,
                    25,
                );

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => {
                cond = code >> 28;
                jump = 4 + sign_extend32((code & 0xFF_FFFF) << 2, 26);
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            ctx.set_branch(ctx.pc.wrapping_add(jump as u32));
        }

        Ok(())
    }

    pub fn bl<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "BL";

        let cond;
        let imm32;
        let new_lr;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                new_lr = ctx.pc.wrapping_add(4) | 1;
                let s = (code >> 26) & 0x1;
                let i1 = (code >> 13) & 0x1 ^ s ^ 1;
                let i2 = (code >> 11) & 0x1 ^ s ^ 1;
                imm32 = 4 + sign_extend32(
                    s << 24 | i2 << 23 | i1 << 22 | (code & 0x3FF_0000) >> 4 | (code & 0x7FF) << 1,
                    25,
                );

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => {
                cond = code >> 28;
                new_lr = ctx.pc;
                imm32 = 4 + sign_extend32((code & 0xFF_FFFF) << 2, 26);
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            ctx.set_lr(new_lr);
            ctx.set_branch(ctx.pc.wrapping_add(imm32 as u32));
        }

        Ok(())
    }

    pub fn blx<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "BLX";

        let cond;
        let target;
        let new_lr;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                new_lr = ctx.pc.wrapping_add(2) | 1;
                let m = (code >> 3) & 0xF;

                reject!(m == 15, NAME, enc, "UNPREDICTABLE");
                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");

                target = ctx.read_gpr(m);
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                new_lr = ctx.pc.wrapping_add(4) | 1;
                let s = (code >> 26) & 0x1;
                let i1 = (code >> 13) & 0x1 ^ s ^ 1;
                let i2 = (code >> 11) & 0x1 ^ s ^ 1;
                let imm32 = sign_extend32(
                    s << 24 | i2 << 23 | i1 << 22 | (code & 0x3FF_0000) >> 4 | (code & 0x7FF) << 1,
                    25,
                );
                target = (ctx.pc.wrapping_add(4) & !3).wrapping_add(imm32 as u32);

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => {
                cond = code >> 28;
                new_lr = ctx.pc;
                target = ctx.read_gpr(code & 0xF);
            }
            Encoding::A2 => {
                cond = 15;
                new_lr = ctx.pc;
                let imm32 = sign_extend32((code & 0xFF_FFFF) << 2 | (code & 0x100_0000) >> 23, 26);
                target = (ctx.pc.wrapping_add(4) | 1).wrapping_add(imm32 as u32);
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            ctx.set_lr(new_lr);
            ctx.branch_exchange(target);
        }

        Ok(())
    }

    pub fn bx<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "BX";

        let cond;
        let target;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                target = ctx.read_gpr((code >> 3) & 0xF);

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => {
                cond = code >> 28;
                target = ctx.read_gpr(code & 0xF);
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            ctx.branch_exchange(target);
        }

        Ok(())
    }

    /// CBZ and CBNZ. Compares against zero without touching the flags and
    /// ignores the APSR entirely.
    pub fn cb_z<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "CB_Z";

        let n;
        let imm32;
        let nonzero;

        match enc {
            Encoding::T1 => {
                n = code & 0x7;
                imm32 = (code & 0xF8) >> 2 | (code & 0x200) >> 3;
                nonzero = code.check_bit(11);

                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if (ctx.read_gpr(n) == 0) ^ nonzero {
            ctx.set_branch(ctx.pc.wrapping_add(4).wrapping_add(imm32));
        }

        Ok(())
    }

    /// TBB and TBH: branch forward by twice the table entry at `Rn + Rm`
    /// (bytes) or `Rn + 2*Rm` (halfwords).
    pub fn tb<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "TB";

        let cond;
        let n;
        let m;
        let halfword;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                m = code & 0xF;
                halfword = code.check_bit(4);

                reject!(n == 13 || m == 13 || m == 15, NAME, enc, "UNPREDICTABLE");
                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let base = ctx.read_gpr(n);
            let entry = if halfword {
                u32::from(bus.read_16(base.wrapping_add(ctx.read_gpr(m) << 1)))
            } else {
                u32::from(bus.read_8(base.wrapping_add(ctx.read_gpr(m))))
            };

            ctx.set_branch(ctx.pc.wrapping_add(4).wrapping_add(entry * 2));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emulator::bus::testing::FlatBus;
    use crate::emulator::bus::Bus;
    use crate::emulator::cpu::registers::InstructionSet;
    use crate::emulator::cpu::{Armv7, Context, Encoding, OpcodeError};

    fn ctx_at(pc: u32) -> Context {
        let mut ctx = Context::new(1);
        ctx.pc = pc;
        ctx
    }

    #[test]
    fn conditional_branch_respects_flags() {
        let mut ctx = ctx_at(0x100);
        let mut bus = FlatBus::new(0);

        // BEQ +0x20 with Z clear: not taken.
        Armv7::b(&mut ctx, 0x10, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), None);

        // Taken once Z is set: target = PC + 4 + 0x20.
        ctx.apsr.z = true;
        Armv7::b(&mut ctx, 0x10, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), Some(0x124));
    }

    #[test]
    fn unconditional_branch_backwards() {
        let mut ctx = ctx_at(0x100);
        let mut bus = FlatBus::new(0);

        // B -8 (imm11 = 0x7FC): target = PC + 4 - 8.
        Armv7::b(&mut ctx, 0x7FC, Encoding::T2, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), Some(0xFC));
    }

    #[test]
    fn bl_links_with_thumb_bit() {
        let mut ctx = ctx_at(0x1000);
        let mut bus = FlatBus::new(0);

        // BL +0x100 (imm11 = 0x80, J1 = J2 = 1).
        let code = 1 << 13 | 1 << 11 | 0x80;
        Armv7::bl(&mut ctx, code, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.lr(), 0x1005);
        assert_eq!(ctx.take_branch(), Some(0x1104));
    }

    #[test]
    fn blx_register_switches_to_arm() {
        let mut ctx = ctx_at(0x1000);
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(3, 0x8000_0100); // bit 0 clear: ARM

        // BLX R3
        Armv7::blx(&mut ctx, 3 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.lr(), 0x1003);
        assert_eq!(ctx.iset, InstructionSet::Arm);
        assert_eq!(ctx.take_branch(), Some(0x8000_0100));
    }

    #[test]
    fn bx_lr_is_a_thumb_return() {
        let mut ctx = ctx_at(0x2000);
        let mut bus = FlatBus::new(0);
        ctx.set_lr(0x8000_0235);

        // BX LR
        Armv7::bx(&mut ctx, 14 << 3, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.iset, InstructionSet::Thumb);
        assert_eq!(ctx.take_branch(), Some(0x8000_0234));
    }

    #[test]
    fn cbz_and_cbnz_test_the_register_not_the_flags() {
        let mut ctx = ctx_at(0x100);
        let mut bus = FlatBus::new(0);
        ctx.apsr.z = false;

        // CBZ R1, +0x10 (imm5 = 8) with R1 == 0: taken.
        let code = 8 << 3 | 1;
        Armv7::cb_z(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), Some(0x114));

        // CBNZ (bit 11) with R1 == 0: not taken.
        let code = 1 << 11 | 8 << 3 | 1;
        Armv7::cb_z(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), None);

        // CBNZ with R1 != 0: taken.
        ctx.write_gpr(1, 7);
        Armv7::cb_z(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), Some(0x114));
    }

    #[test]
    fn branch_inside_it_block_rejects() {
        let mut ctx = ctx_at(0x100);
        let mut bus = FlatBus::new(0);
        ctx.itstate.write(0x08);

        let err = Armv7::b(&mut ctx, 0x10, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));

        ctx.itstate.write(0x04);
        let err = Armv7::cb_z(&mut ctx, 8 << 3 | 1, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));
    }

    #[test]
    fn table_branch_scales_entries() {
        let mut ctx = ctx_at(0x400);
        let mut bus = FlatBus::new(0x1000);
        ctx.write_gpr(0, 0x200); // table base
        ctx.write_gpr(1, 2); // index

        bus.write_8(0x202, 5);
        // TBB [R0, R1]
        let code = 0xE8D0_F000 | 0 << 16 | 1;
        Armv7::tb(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), Some(0x400 + 4 + 10));

        // TBH [R0, R1, LSL #1]
        bus.write_16(0x204, 0x30);
        let code = 0xE8D0_F010 | 0 << 16 | 1;
        Armv7::tb(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.take_branch(), Some(0x400 + 4 + 0x60));
    }
}
