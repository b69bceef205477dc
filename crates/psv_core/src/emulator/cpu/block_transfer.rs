//! Block register transfers: the stack forms and the general
//! load/store-multiple family.
//!
//! Memory order is fixed by the architecture: the lowest-numbered register
//! always occupies the lowest address, whichever direction the base moves.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::condition_passed;
use crate::emulator::cpu::error::{bad_encoding, not_implemented, reject};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};
use crate::utils::BitOps;

impl Armv7 {
    pub fn push<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "PUSH";

        let cond;
        let reg_list;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                reg_list = (code & 0x100) << 6 | (code & 0xFF);

                reject!(reg_list == 0, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                reg_list = code & 0x5FFF;

                reject!(reg_list.count_ones() < 2, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                reg_list = 1 << ((code & 0xF000) >> 12);

                reject!(reg_list & 0x8000 != 0 || reg_list & 0x2000 != 0, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => {
                cond = code >> 28;
                reg_list = code & 0xFFFF;

                reject!(reg_list.count_ones() < 2, NAME, enc, "STMDB / STMFD");
            }
            Encoding::A2 => {
                cond = code >> 28;
                reg_list = 1 << ((code & 0xF000) >> 12);

                reject!(reg_list & 0x2000 != 0, NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let mut read = 0;
            for i in (0..16).rev() {
                if reg_list.check_bit(i) {
                    read += 4;
                    bus.write_32(ctx.sp().wrapping_sub(read), ctx.read_gpr(u32::from(i)));
                }
            }

            let new_sp = ctx.sp().wrapping_sub(read);
            ctx.set_sp(new_sp);
        }

        Ok(())
    }

    pub fn pop<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "POP";

        let cond;
        let reg_list;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                reg_list = (code & 0x100) << 7 | (code & 0xFF);

                reject!(reg_list == 0, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                reg_list = code & 0xDFFF;

                reject!(
                    reg_list.count_ones() < 2 || (reg_list & 0x8000 != 0 && reg_list & 0x4000 != 0),
                    NAME,
                    enc,
                    "UNPREDICTABLE"
                );
                reject!(reg_list & 0x8000 != 0 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T3 => {
                cond = ctx.itstate.advance();
                reg_list = 1 << ((code & 0xF000) >> 12);

                reject!(
                    reg_list & 0x2000 != 0 || (reg_list & 0x8000 != 0 && ctx.itstate.active()),
                    NAME,
                    enc,
                    "UNPREDICTABLE"
                );
            }
            Encoding::A1 => {
                cond = code >> 28;
                reg_list = code & 0xFFFF;

                reject!(reg_list.count_ones() < 2, NAME, enc, "LDM / LDMIA / LDMFD");
                reject!(reg_list & 0x2000 != 0, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A2 => {
                cond = code >> 28;
                reg_list = 1 << ((code & 0xF000) >> 12);

                reject!(reg_list & 0x2000 != 0, NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let mut written = 0;
            for i in 0..16 {
                if reg_list.check_bit(i) {
                    let value = bus.read_32(ctx.sp().wrapping_add(written));
                    ctx.write_gpr(u32::from(i), value);
                    written += 4;
                }
            }

            let new_sp = ctx.sp().wrapping_add(written);
            ctx.set_sp(new_sp);
        }

        Ok(())
    }

    pub fn ldm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDM";

        let cond;
        let n;
        let reg_list;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0x700) >> 8;
                reg_list = code & 0xFF;
                wback = !reg_list.check_bit(n as u8);

                reject!(reg_list == 0, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                reg_list = code & 0xDFFF;
                wback = code.check_bit(21);

                reject!(wback && n == 13, NAME, enc, "POP");
                reject!(
                    n == 15 || reg_list.count_ones() < 2 || (reg_list & 0x8000 != 0 && reg_list & 0x4000 != 0),
                    NAME,
                    enc,
                    "UNPREDICTABLE"
                );
                reject!(reg_list & 0x8000 != 0 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
                reject!(wback && reg_list.check_bit(n as u8), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let mut addr = ctx.read_gpr(n);
            let final_addr = addr.wrapping_add(4 * reg_list.count_ones());

            for i in 0..16 {
                if reg_list.check_bit(i) {
                    let value = bus.read_32(addr);
                    ctx.write_gpr(u32::from(i), value);
                    addr = addr.wrapping_add(4);
                }
            }

            if wback {
                ctx.write_gpr(n, final_addr);
            }
        }

        Ok(())
    }

    pub fn stm<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STM";

        let cond;
        let n;
        let reg_list;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0x700) >> 8;
                reg_list = code & 0xFF;
                wback = true;

                reject!(reg_list == 0, NAME, enc, "UNPREDICTABLE");
            }
            Encoding::T2 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                reg_list = code & 0x5FFF;
                wback = code.check_bit(21);

                reject!(wback && n == 13, NAME, enc, "PUSH");
                reject!(n == 15 || reg_list.count_ones() < 2, NAME, enc, "UNPREDICTABLE");
                reject!(wback && reg_list.check_bit(n as u8), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let mut addr = ctx.read_gpr(n);
            let final_addr = addr.wrapping_add(4 * reg_list.count_ones());

            for i in 0..16 {
                if reg_list.check_bit(i) {
                    bus.write_32(addr, ctx.read_gpr(u32::from(i)));
                    addr = addr.wrapping_add(4);
                }
            }

            if wback {
                ctx.write_gpr(n, final_addr);
            }
        }

        Ok(())
    }

    pub fn ldmdb<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "LDMDB";

        let cond;
        let n;
        let reg_list;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                reg_list = code & 0xDFFF;
                wback = code.check_bit(21);

                reject!(
                    n == 15 || reg_list.count_ones() < 2 || (reg_list & 0x8000 != 0 && reg_list & 0x4000 != 0),
                    NAME,
                    enc,
                    "UNPREDICTABLE"
                );
                reject!(reg_list & 0x8000 != 0 && ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
                reject!(wback && reg_list.check_bit(n as u8), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let base = ctx.read_gpr(n).wrapping_sub(4 * reg_list.count_ones());
            let mut addr = base;

            for i in 0..16 {
                if reg_list.check_bit(i) {
                    let value = bus.read_32(addr);
                    ctx.write_gpr(u32::from(i), value);
                    addr = addr.wrapping_add(4);
                }
            }

            if wback {
                ctx.write_gpr(n, base);
            }
        }

        Ok(())
    }

    pub fn stmdb<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "STMDB";

        let cond;
        let n;
        let reg_list;
        let wback;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                n = (code & 0xF_0000) >> 16;
                reg_list = code & 0x5FFF;
                wback = code.check_bit(21);

                reject!(wback && n == 13, NAME, enc, "PUSH");
                reject!(n == 15 || reg_list.count_ones() < 2, NAME, enc, "UNPREDICTABLE");
                reject!(wback && reg_list.check_bit(n as u8), NAME, enc, "UNPREDICTABLE");
            }
            Encoding::A1 => return not_implemented(NAME, enc),
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            let base = ctx.read_gpr(n).wrapping_sub(4 * reg_list.count_ones());
            let mut addr = base;

            for i in 0..16 {
                if reg_list.check_bit(i) {
                    bus.write_32(addr, ctx.read_gpr(u32::from(i)));
                    addr = addr.wrapping_add(4);
                }
            }

            if wback {
                ctx.write_gpr(n, base);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emulator::bus::testing::FlatBus;
    use crate::emulator::bus::Bus;
    use crate::emulator::cpu::registers::InstructionSet;
    use crate::emulator::cpu::{Armv7, Context, Encoding};

    fn ctx() -> Context {
        Context::new(1)
    }

    #[test]
    fn push_lays_out_registers_low_to_high() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x2000);
        ctx.set_sp(0x1000);
        ctx.write_gpr(0, 0xA);
        ctx.write_gpr(1, 0xB);
        ctx.write_gpr(2, 0xC);
        ctx.write_gpr(3, 0xD);

        // PUSH {R0-R3}
        Armv7::push(&mut ctx, 0x0F, Encoding::T1, &mut bus).unwrap();

        assert_eq!(ctx.sp(), 0xFF0);
        assert_eq!(bus.read_32(0xFF0), 0xA);
        assert_eq!(bus.read_32(0xFF4), 0xB);
        assert_eq!(bus.read_32(0xFF8), 0xC);
        assert_eq!(bus.read_32(0xFFC), 0xD);

        // POP {R4-R7} restores the values and the stack pointer.
        Armv7::pop(&mut ctx, 0xF0, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.sp(), 0x1000);
        assert_eq!(ctx.read_gpr(4), 0xA);
        assert_eq!(ctx.read_gpr(5), 0xB);
        assert_eq!(ctx.read_gpr(6), 0xC);
        assert_eq!(ctx.read_gpr(7), 0xD);
    }

    #[test]
    fn push_pop_round_trips_any_mask() {
        for mask in [0x0Fu32, 0xA5, 0x81, 0xFF] {
            let mut ctx = ctx();
            let mut bus = FlatBus::new(0x2000);
            ctx.set_sp(0x1800);
            for i in 0..8 {
                ctx.write_gpr(i, 0x100 + i);
            }

            Armv7::push(&mut ctx, mask, Encoding::T1, &mut bus).unwrap();
            for i in 0..8 {
                ctx.write_gpr(i, 0);
            }
            Armv7::pop(&mut ctx, mask, Encoding::T1, &mut bus).unwrap();

            assert_eq!(ctx.sp(), 0x1800, "mask {mask:#x}");
            for i in 0..8 {
                if mask & (1 << i) != 0 {
                    assert_eq!(ctx.read_gpr(i), 0x100 + i, "mask {mask:#x} reg {i}");
                }
            }
        }
    }

    #[test]
    fn push_lr_pop_pc_returns_to_thumb() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x2000);
        ctx.set_sp(0x1000);
        ctx.set_lr(0x8000_1235); // Thumb return address

        // PUSH {LR}
        Armv7::push(&mut ctx, 0x100, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.sp(), 0xFFC);

        // POP {PC}
        Armv7::pop(&mut ctx, 0x100, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.sp(), 0x1000);
        assert_eq!(ctx.iset, InstructionSet::Thumb);
        assert_eq!(ctx.take_branch(), Some(0x8000_1234));
    }

    #[test]
    fn ldm_stm_round_trip_with_writeback() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x2000);
        ctx.write_gpr(0, 0x800);
        ctx.write_gpr(1, 0x11);
        ctx.write_gpr(2, 0x22);
        ctx.write_gpr(3, 0x33);

        // STMIA R0!, {R1-R3}
        Armv7::stm(&mut ctx, 0x0E | 0 << 8, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0x80C);
        assert_eq!(bus.read_32(0x800), 0x11);
        assert_eq!(bus.read_32(0x808), 0x33);

        // LDMIA R4!, {R1-R3} from the same block.
        ctx.write_gpr(4, 0x800);
        ctx.write_gpr(1, 0);
        ctx.write_gpr(2, 0);
        ctx.write_gpr(3, 0);
        Armv7::ldm(&mut ctx, 0x0E | 4 << 8, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(1), 0x11);
        assert_eq!(ctx.read_gpr(2), 0x22);
        assert_eq!(ctx.read_gpr(3), 0x33);
        assert_eq!(ctx.read_gpr(4), 0x80C);
    }

    #[test]
    fn ldm_with_base_in_list_skips_writeback() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x2000);
        ctx.write_gpr(2, 0x900);
        bus.write_32(0x900, 7);

        // LDMIA R2, {R2}: base in the list suppresses writeback.
        Armv7::ldm(&mut ctx, 0x04 | 2 << 8, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 7);
    }

    #[test]
    fn stmdb_pairs_with_ldm() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x2000);
        ctx.write_gpr(0, 0x1000);
        ctx.write_gpr(4, 0x44);
        ctx.write_gpr(5, 0x55);

        // STMDB R0!, {R4, R5}
        let code = 0xE900_0000 | 0 << 16 | 0x0020_0000 | 0x30;
        Armv7::stmdb(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(0), 0xFF8);
        assert_eq!(bus.read_32(0xFF8), 0x44);
        assert_eq!(bus.read_32(0xFFC), 0x55);

        // LDMDB round trip from the original base.
        ctx.write_gpr(1, 0x1000);
        ctx.write_gpr(4, 0);
        ctx.write_gpr(5, 0);
        let code = 0xE910_0000 | 1 << 16 | 0x30;
        Armv7::ldmdb(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(4), 0x44);
        assert_eq!(ctx.read_gpr(5), 0x55);
        assert_eq!(ctx.read_gpr(1), 0x1000); // no writeback bit
    }

    #[test]
    fn pop_with_pc_inside_it_block_rejects_unless_last() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0x2000);
        ctx.apsr.z = true;
        ctx.itstate.write(0x04); // two slots remaining

        let err = Armv7::pop(&mut ctx, 0x100, Encoding::T1, &mut bus);
        // T1 allows it; the 32-bit form rejects.
        assert!(err.is_ok());

        ctx.itstate.write(0x04);
        let code = 0xE8BD_0000 | 0x8000 | 0x000F;
        let err = Armv7::pop(&mut ctx, code, Encoding::T2, &mut bus).unwrap_err();
        assert!(matches!(err, crate::emulator::cpu::OpcodeError::Rejected { .. }));
    }
}
