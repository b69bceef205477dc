//! IT, NOP, the supported coprocessor read, the host-call trampoline and
//! the unknown-opcode sink.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::condition_passed;
use crate::emulator::cpu::error::{bad_encoding, reject, OpcodeError};
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};

impl Armv7 {
    /// Writes the IT execution state for the following one to four
    /// instructions. The instruction itself is unconditional and must not
    /// appear inside another IT block.
    pub fn it<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "IT";

        match enc {
            Encoding::T1 => {
                let mask = code & 0xF;
                let first = (code & 0xF0) >> 4;

                reject!(mask == 0, NAME, enc, "Related encodings");
                reject!(first == 15, NAME, enc, "UNPREDICTABLE");
                reject!(first == 14 && mask.count_ones() != 1, NAME, enc, "UNPREDICTABLE");
                reject!(ctx.itstate.active(), NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        ctx.itstate.write((code & 0xFF) as u8);

        Ok(())
    }

    pub fn nop<B: Bus>(ctx: &mut Context, _code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "NOP";

        match enc {
            Encoding::T1 | Encoding::T2 => {
                ctx.itstate.advance();
                Ok(())
            }
            Encoding::A1 => Ok(()),
            _ => bad_encoding(NAME, enc),
        }
    }

    /// Non-architectural host-call trampoline: transfers control to the
    /// emulated platform service selected by the immediate index.
    pub fn hack<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, bus: &mut B) -> ExecResult {
        const NAME: &str = "HACK";

        let cond;
        let func;

        match enc {
            Encoding::T1 => {
                cond = ctx.itstate.advance();
                func = code & 0xFFFF;
            }
            Encoding::A1 => {
                cond = code >> 28;
                func = (code & 0xF_FF00) >> 4 | (code & 0xF);
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            crate::cpu_log!("host call #{func}");
            bus.host_call(ctx, func as u16);
        }

        Ok(())
    }

    /// Coprocessor register read. Only the thread-ID register
    /// (`p15, 0, Rt, c13, c0, 3`) is accepted, and it currently reads as
    /// zero because no per-thread TLS base is wired up.
    pub fn mrc<B: Bus>(ctx: &mut Context, code: Code, enc: Encoding, _bus: &mut B) -> ExecResult {
        const NAME: &str = "MRC";

        let cond;
        let t;
        let cp;
        let opc1;
        let opc2;
        let cn;
        let cm;

        match enc {
            Encoding::T1 | Encoding::A1 => {
                cond = ctx.itstate.advance();
                t = (code & 0xF000) >> 12;
                cp = (code & 0xF00) >> 8;
                opc1 = (code & 0xE0_0000) >> 21;
                opc2 = (code & 0xE0) >> 5;
                cn = (code & 0xF_0000) >> 16;
                cm = code & 0xF;

                reject!(cp == 10 || cp == 11, NAME, enc, "Advanced SIMD and VFP");
                reject!(t == 13 && enc == Encoding::T1, NAME, enc, "UNPREDICTABLE");
            }
            _ => return bad_encoding(NAME, enc),
        }

        if condition_passed(&ctx.apsr, cond) {
            if cp == 15 && opc1 == 0 && cn == 13 && cm == 0 && opc2 == 3 {
                log::error!("TLS register read requested; returning 0");

                if t < 15 {
                    ctx.write_gpr(t, 0);
                    return Ok(());
                }
            }

            return Err(OpcodeError::Unsupported {
                mnemonic: NAME,
                encoding: enc,
                reason: format!("coprocessor access p{cp}, {opc1}, r{t}, c{cn}, c{cm}, {opc2}"),
            });
        }

        Ok(())
    }

    /// Catch-all sink for opcode patterns without a handler.
    pub fn unk<B: Bus>(_ctx: &mut Context, code: Code, _enc: Encoding, _bus: &mut B) -> ExecResult {
        Err(OpcodeError::Unknown {
            hw1: (code >> 16) as u16,
            hw0: code as u16,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::emulator::bus::testing::FlatBus;
    use crate::emulator::cpu::{Armv7, Context, Encoding, OpcodeError};

    fn ctx() -> Context {
        Context::new(1)
    }

    /// ITT EQ followed by two `ADDS`-shaped instructions: both execute only
    /// when Z was set on entry, and the block drains afterwards.
    #[test]
    fn it_block_gates_two_instructions() {
        for z in [true, false] {
            let mut ctx = ctx();
            let mut bus = FlatBus::new(0);
            ctx.apsr.z = z;
            ctx.write_gpr(1, 10);

            // ITT EQ: firstcond = 0000, mask = 0100.
            Armv7::it(&mut ctx, 0x04, Encoding::T1, &mut bus).unwrap();
            assert!(ctx.itstate.active());

            // ADD R0, R1, #1 ; ADD R0, R0, #2
            Armv7::add_imm(&mut ctx, 1 << 6 | 1 << 3, Encoding::T1, &mut bus).unwrap();
            Armv7::add_imm(&mut ctx, 2 << 6 | 0 << 3, Encoding::T1, &mut bus).unwrap();

            if z {
                assert_eq!(ctx.read_gpr(0), 13);
            } else {
                assert_eq!(ctx.read_gpr(0), 0);
            }
            // The flags survive untouched either way.
            assert_eq!(ctx.apsr.z, z);
            assert!(!ctx.itstate.active());
        }
    }

    #[test]
    fn it_inside_it_block_rejects() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        Armv7::it(&mut ctx, 0x04, Encoding::T1, &mut bus).unwrap();
        let err = Armv7::it(&mut ctx, 0x04, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));
    }

    #[test]
    fn it_rejects_malformed_masks() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // Zero mask belongs to the hint space.
        let err = Armv7::it(&mut ctx, 0xE0, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { reason: "Related encodings", .. }));

        // AL condition with more than one slot.
        let err = Armv7::it(&mut ctx, 0xE5, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));
    }

    #[test]
    fn hack_invokes_the_service_table() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        Armv7::hack(&mut ctx, 0x002A, Encoding::T1, &mut bus).unwrap();
        assert_eq!(bus.host_calls, vec![0x2A]);

        // A1 form reassembles the split immediate and honours its condition.
        // Index 0x123 = imm12 0x12 in bits 8..19, low nibble 0x3, cond = NE.
        let code = 0x1000_0000 | 0x12 << 8 | 0x3;
        ctx.apsr.z = true; // NE fails
        Armv7::hack(&mut ctx, code, Encoding::A1, &mut bus).unwrap();
        assert_eq!(bus.host_calls.len(), 1);

        ctx.apsr.z = false;
        Armv7::hack(&mut ctx, code, Encoding::A1, &mut bus).unwrap();
        assert_eq!(bus.host_calls, vec![0x2A, 0x123]);
    }

    #[test]
    fn mrc_thread_id_register_reads_zero() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);
        ctx.write_gpr(2, 0xFFFF_FFFF);

        // mrc p15, 0, r2, c13, c0, 3
        let code = 15 << 8 | 13 << 16 | 2 << 12 | 3 << 5;
        Armv7::mrc(&mut ctx, code, Encoding::T1, &mut bus).unwrap();
        assert_eq!(ctx.read_gpr(2), 0);
    }

    #[test]
    fn mrc_other_coprocessor_accesses_fail() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        // VFP coprocessors are rejected at decode.
        let code = 10 << 8 | 13 << 16 | 2 << 12 | 3 << 5;
        let err = Armv7::mrc(&mut ctx, code, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Rejected { .. }));

        // A system-control read other than the thread ID register fails
        // after the condition check.
        let code = 15 << 8 | 1 << 16 | 2 << 12;
        let err = Armv7::mrc(&mut ctx, code, Encoding::T1, &mut bus).unwrap_err();
        assert!(matches!(err, OpcodeError::Unsupported { .. }));
    }

    #[test]
    fn unknown_opcode_carries_halfwords() {
        let mut ctx = ctx();
        let mut bus = FlatBus::new(0);

        let err = Armv7::unk(&mut ctx, 0xF7F0_A000, Encoding::T1, &mut bus).unwrap_err();
        assert_eq!(
            err,
            OpcodeError::Unknown {
                hw1: 0xF7F0,
                hw0: 0xA000
            }
        );
    }
}
