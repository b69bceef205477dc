//! Machinery shared by every semantic routine: the barrel shifter,
//! carry-aware arithmetic, Thumb-2 immediate expansion and condition
//! evaluation.

use crate::emulator::cpu::registers::Apsr;
use crate::emulator::cpu::{Code, Context};
use crate::utils::BitOps;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ShiftType {
    LogicalLeft = 0b00,
    LogicalRight = 0b01,
    ArithRight = 0b10,
    RotateRight = 0b11,
    /// One-bit rotate through carry. Only ever produced by
    /// [`decode_imm_shift`] for a rotate amount of zero.
    RotateRightExtend = 0b100,
}

impl ShiftType {
    /// Performs the shift, returning the result and the shifter carry-out.
    ///
    /// An amount of zero is the identity for every type and leaves the carry
    /// untouched; encodings where a zero immediate means something else
    /// (shift by 32, RRX) resolve that in [`decode_imm_shift`] before this
    /// is called.
    #[inline]
    pub fn perform_shift(self, value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
        if amount == 0 {
            return (value, carry_in);
        }

        match self {
            ShiftType::LogicalLeft => match amount {
                1..=31 => (value << amount, value.check_bit((32 - amount) as u8)),
                32 => (0, value.check_bit(0)),
                _ => (0, false),
            },
            ShiftType::LogicalRight => match amount {
                1..=31 => (value >> amount, value.check_bit((amount - 1) as u8)),
                32 => (0, value.check_bit(31)),
                _ => (0, false),
            },
            ShiftType::ArithRight => {
                if amount < 32 {
                    (((value as i32) >> amount) as u32, value.check_bit((amount - 1) as u8))
                } else {
                    // Sign fill; the carry repeats the sign bit.
                    let carry = value.check_bit(31);
                    (if carry { u32::MAX } else { 0 }, carry)
                }
            }
            ShiftType::RotateRight => {
                let result = value.rotate_right(amount % 32);
                (result, result.check_bit(31))
            }
            ShiftType::RotateRightExtend => (((carry_in as u32) << 31) | (value >> 1), value.check_bit(0)),
        }
    }
}

/// Decodes the 2-bit shift type and 5-bit amount field of an immediate-shift
/// operand. A zero amount selects shift-by-32 for LSR/ASR and RRX for ROR.
pub fn decode_imm_shift(ty: u32, imm5: u32) -> (ShiftType, u32) {
    match ty & 0b11 {
        0b00 => (ShiftType::LogicalLeft, imm5),
        0b01 => (ShiftType::LogicalRight, if imm5 == 0 { 32 } else { imm5 }),
        0b10 => (ShiftType::ArithRight, if imm5 == 0 { 32 } else { imm5 }),
        _ => {
            if imm5 == 0 {
                (ShiftType::RotateRightExtend, 1)
            } else {
                (ShiftType::RotateRight, imm5)
            }
        }
    }
}

/// 32-bit add with carry-in, returning `(result, carry_out, overflow)`.
///
/// `carry_out` is the unsigned overflow of the addition and `overflow` the
/// signed one, so `add_with_carry(a, !b, true)` carries the compare
/// semantics: afterwards `carry_out` holds the unsigned `a >= b` relation.
#[inline]
pub fn add_with_carry(x: u32, y: u32, carry_in: bool) -> (u32, bool, bool) {
    let unsigned = u64::from(x) + u64::from(y) + u64::from(carry_in);
    let signed = i64::from(x as i32) + i64::from(y as i32) + i64::from(carry_in);
    let result = unsigned as u32;

    (result, u64::from(result) != unsigned, i64::from(result as i32) != signed)
}

/// Thumb-2 modified-immediate expansion with shifter carry.
///
/// A nonzero rotate field rotates the `1`-prefixed low seven bits and
/// updates the carry from the result's top bit; otherwise one of the four
/// byte-replication patterns applies and the carry passes through.
pub fn thumb_expand_imm_c(imm12: u32, carry_in: bool) -> (u32, bool) {
    if imm12 & 0xC00 != 0 {
        let unrotated = (imm12 & 0x7F) | 0x80;
        let result = unrotated.rotate_right((imm12 & 0xF80) >> 7);
        (result, result.check_bit(31))
    } else {
        let imm8 = imm12 & 0xFF;
        let value = match (imm12 & 0x300) >> 8 {
            0b00 => imm8,
            0b01 => imm8 << 16 | imm8,
            0b10 => imm8 << 24 | imm8 << 8,
            _ => imm8 << 24 | imm8 << 16 | imm8 << 8 | imm8,
        };
        (value, carry_in)
    }
}

/// Immediate expansion for encodings that leave the carry flag alone.
pub fn thumb_expand_imm(ctx: &Context, imm12: u32) -> u32 {
    thumb_expand_imm_c(imm12, ctx.apsr.c).0
}

/// Evaluates a 4-bit condition code against the APSR.
///
/// The low bit inverts the sense of the other three; condition 15 ("NV") is
/// treated as always, as nothing in user-mode code reaches its architectural
/// meaning.
pub fn condition_passed(apsr: &Apsr, cond: u32) -> bool {
    let result = match cond >> 1 {
        0 => apsr.z,
        1 => apsr.c,
        2 => apsr.n,
        3 => apsr.v,
        4 => apsr.c && !apsr.z,
        5 => apsr.n == apsr.v,
        6 => apsr.n == apsr.v && !apsr.z,
        _ => return true,
    };

    if cond & 1 != 0 {
        !result
    } else {
        result
    }
}

/// Reassembles the scattered `i:imm3:imm8` modified-immediate field of a
/// 32-bit Thumb encoding into a contiguous 12-bit value.
#[inline]
pub fn thumb32_imm12(code: Code) -> u32 {
    (code & 0x400_0000) >> 15 | (code & 0x7000) >> 4 | (code & 0xFF)
}

/// Reassembles the `imm4:i:imm3:imm8` field of the 16-bit-immediate move
/// encodings.
#[inline]
pub fn thumb32_imm16(code: Code) -> u32 {
    (code & 0xF_0000) >> 4 | (code & 0x400_0000) >> 15 | (code & 0x7000) >> 4 | (code & 0xFF)
}

/// Extracts the split `imm3:imm2` shift-amount field of 32-bit register
/// operands.
#[inline]
pub fn thumb32_shift_amount(code: Code) -> u32 {
    (code & 0x7000) >> 10 | (code & 0xC0) >> 6
}

/// Decodes the complete immediate-shift operand of a 32-bit register form.
#[inline]
pub fn thumb32_imm_shift(code: Code) -> (ShiftType, u32) {
    decode_imm_shift((code & 0x30) >> 4, thumb32_shift_amount(code))
}
