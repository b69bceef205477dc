//! Declared-but-unimplemented mnemonics.
//!
//! Everything here fails with a tagged `NotImplemented` error before
//! touching any state, so the dispatcher can report exactly which
//! instruction a title depends on. The bulk is the NEON/VFP surface and the
//! saturating/packed integer SIMD families; the integer divides are also
//! here because the target silicon has no divide unit.

use crate::emulator::bus::Bus;
use crate::emulator::cpu::error::OpcodeError;
use crate::emulator::cpu::{Armv7, Code, Context, Encoding, ExecResult};

macro_rules! not_implemented_ops {
    ($($fn_name:ident => $mnemonic:literal,)+) => {
        impl Armv7 {
            $(
                pub fn $fn_name<B: Bus>(
                    _ctx: &mut Context,
                    _code: Code,
                    enc: Encoding,
                    _bus: &mut B,
                ) -> ExecResult {
                    Err(OpcodeError::NotImplemented {
                        mnemonic: $mnemonic,
                        encoding: enc,
                    })
                }
            )+
        }
    };
}

not_implemented_ops! {
    // ARM-only register-shifted-register data processing.
    adc_rsr => "ADC_RSR",
    add_rsr => "ADD_RSR",
    and_rsr => "AND_RSR",
    bic_rsr => "BIC_RSR",
    cmn_rsr => "CMN_RSR",
    cmp_rsr => "CMP_RSR",
    eor_rsr => "EOR_RSR",
    mvn_rsr => "MVN_RSR",
    orr_rsr => "ORR_RSR",
    rsb_rsr => "RSB_RSR",
    rsc_imm => "RSC_IMM",
    rsc_reg => "RSC_REG",
    rsc_rsr => "RSC_RSR",
    sbc_rsr => "SBC_RSR",
    sub_rsr => "SUB_RSR",
    sub_spr => "SUB_SPR",
    teq_rsr => "TEQ_RSR",
    tst_rsr => "TST_RSR",

    // Bit-field and packing operations.
    bfc => "BFC",
    bfi => "BFI",
    pkh => "PKH",
    rbit => "RBIT",
    sbfx => "SBFX",
    ubfx => "UBFX",

    // Integer divide (no divide unit on the target core).
    sdiv => "SDIV",
    udiv => "UDIV",

    // System and exception-generating instructions.
    bkpt => "BKPT",
    mrs => "MRS",
    msr_imm => "MSR_IMM",
    msr_reg => "MSR_REG",
    svc => "SVC",
    wfe => "WFE",
    wfi => "WFI",
    yield_hint => "YIELD",

    // Remaining load/store forms.
    ldmda => "LDMDA",
    ldmib => "LDMIB",
    ldrb_lit => "LDRB_LIT",
    ldrd_lit => "LDRD_LIT",
    ldrd_reg => "LDRD_REG",
    ldrh_lit => "LDRH_LIT",
    ldrsb_lit => "LDRSB_LIT",
    ldrsh_lit => "LDRSH_LIT",
    stmda => "STMDA",
    stmib => "STMIB",
    strd_reg => "STRD_REG",

    // Byte/halfword/doubleword exclusives.
    ldrexb => "LDREXB",
    ldrexd => "LDREXD",
    ldrexh => "LDREXH",
    strexb => "STREXB",
    strexd => "STREXD",
    strexh => "STREXH",

    // Saturating and packed integer SIMD.
    qadd => "QADD",
    qadd16 => "QADD16",
    qadd8 => "QADD8",
    qasx => "QASX",
    qdadd => "QDADD",
    qdsub => "QDSUB",
    qsax => "QSAX",
    qsub => "QSUB",
    qsub16 => "QSUB16",
    qsub8 => "QSUB8",
    sadd16 => "SADD16",
    sadd8 => "SADD8",
    sasx => "SASX",
    sel => "SEL",
    shadd16 => "SHADD16",
    shadd8 => "SHADD8",
    shasx => "SHASX",
    shsax => "SHSAX",
    shsub16 => "SHSUB16",
    shsub8 => "SHSUB8",
    ssat => "SSAT",
    ssat16 => "SSAT16",
    ssax => "SSAX",
    ssub16 => "SSUB16",
    ssub8 => "SSUB8",
    uadd16 => "UADD16",
    uadd8 => "UADD8",
    uasx => "UASX",
    uhadd16 => "UHADD16",
    uhadd8 => "UHADD8",
    uhasx => "UHASX",
    uhsax => "UHSAX",
    uhsub16 => "UHSUB16",
    uhsub8 => "UHSUB8",
    uqadd16 => "UQADD16",
    uqadd8 => "UQADD8",
    uqasx => "UQASX",
    uqsax => "UQSAX",
    uqsub16 => "UQSUB16",
    uqsub8 => "UQSUB8",
    usad8 => "USAD8",
    usada8 => "USADA8",
    usat => "USAT",
    usat16 => "USAT16",
    usax => "USAX",
    usub16 => "USUB16",
    usub8 => "USUB8",

    // Halfword multiplies and the wide accumulate exotics.
    smla_half => "SMLA",
    smlad => "SMLAD",
    smlal_half => "SMLAL_HALF",
    smlald => "SMLALD",
    smlaw => "SMLAW",
    smlsd => "SMLSD",
    smlsld => "SMLSLD",
    smmla => "SMMLA",
    smmls => "SMMLS",
    smmul => "SMMUL",
    smuad => "SMUAD",
    smul_half => "SMUL",
    smulw => "SMULW",
    smusd => "SMUSD",
    umaal => "UMAAL",

    // Extend-and-add.
    sxtab => "SXTAB",
    sxtab16 => "SXTAB16",
    sxtah => "SXTAH",
    sxtb16 => "SXTB16",
    uxtab => "UXTAB",
    uxtab16 => "UXTAB16",
    uxtah => "UXTAH",
    uxtb16 => "UXTB16",

    // NEON / VFP.
    vaba => "VABA",
    vabd => "VABD",
    vabd_fp => "VABD_FP",
    vabs => "VABS",
    vac => "VAC",
    vadd => "VADD",
    vadd_fp => "VADD_FP",
    vadd_lw => "VADD_LW",
    vaddhn => "VADDHN",
    vand => "VAND",
    vbic_imm => "VBIC_IMM",
    vbic_reg => "VBIC_REG",
    vbif => "VBIF",
    vceq_reg => "VCEQ_REG",
    vceq_zero => "VCEQ_ZERO",
    vcge_reg => "VCGE_REG",
    vcge_zero => "VCGE_ZERO",
    vcgt_reg => "VCGT_REG",
    vcgt_zero => "VCGT_ZERO",
    vcle_zero => "VCLE_ZERO",
    vcls => "VCLS",
    vclt_zero => "VCLT_ZERO",
    vclz => "VCLZ",
    vcmp => "VCMP",
    vcnt => "VCNT",
    vcvt_df => "VCVT_DF",
    vcvt_ffa => "VCVT_FFA",
    vcvt_fff => "VCVT_FFF",
    vcvt_fia => "VCVT_FIA",
    vcvt_fif => "VCVT_FIF",
    vcvt_hfa => "VCVT_HFA",
    vcvt_hff => "VCVT_HFF",
    vdiv => "VDIV",
    vdup_reg => "VDUP_REG",
    vdup_scalar => "VDUP_SCALAR",
    veor => "VEOR",
    vext => "VEXT",
    vhaddsub => "VHADDSUB",
    vld_multi => "VLD_MULTI",
    vld1_single => "VLD1_SINGLE",
    vld1_single_all => "VLD1_SINGLE_ALL",
    vld2_single => "VLD2_SINGLE",
    vld2_single_all => "VLD2_SINGLE_ALL",
    vld3_single => "VLD3_SINGLE",
    vld3_single_all => "VLD3_SINGLE_ALL",
    vld4_single => "VLD4_SINGLE",
    vld4_single_all => "VLD4_SINGLE_ALL",
    vldm => "VLDM",
    vldr => "VLDR",
    vmaxmin => "VMAXMIN",
    vmaxmin_fp => "VMAXMIN_FP",
    vmla => "VMLA",
    vmla_fp => "VMLA_FP",
    vmla_scalar => "VMLA_SCALAR",
    vmov_2rd => "VMOV_2RD",
    vmov_2rf => "VMOV_2RF",
    vmov_imm => "VMOV_IMM",
    vmov_reg => "VMOV_REG",
    vmov_rf => "VMOV_RF",
    vmov_rs => "VMOV_RS",
    vmov_sr => "VMOV_SR",
    vmovl => "VMOVL",
    vmovn => "VMOVN",
    vmrs => "VMRS",
    vmsr => "VMSR",
    vmul => "VMUL",
    vmul_fp => "VMUL_FP",
    vmul_scalar => "VMUL_SCALAR",
    vmvn_imm => "VMVN_IMM",
    vmvn_reg => "VMVN_REG",
    vneg => "VNEG",
    vnm => "VNM",
    vorn_reg => "VORN_REG",
    vorr_imm => "VORR_IMM",
    vorr_reg => "VORR_REG",
    vpadal => "VPADAL",
    vpadd => "VPADD",
    vpadd_fp => "VPADD_FP",
    vpaddl => "VPADDL",
    vpmaxmin => "VPMAXMIN",
    vpmaxmin_fp => "VPMAXMIN_FP",
    vpop => "VPOP",
    vpush => "VPUSH",
    vqabs => "VQABS",
    vqadd => "VQADD",
    vqdmlal => "VQDMLAL",
    vqdmulh => "VQDMULH",
    vqdmull => "VQDMULL",
    vqmovn => "VQMOVN",
    vqneg => "VQNEG",
    vqrdmulh => "VQRDMULH",
    vqrshl => "VQRSHL",
    vqrshrn => "VQRSHRN",
    vqshl_imm => "VQSHL_IMM",
    vqshl_reg => "VQSHL_REG",
    vqshrn => "VQSHRN",
    vqsub => "VQSUB",
    vraddhn => "VRADDHN",
    vrecpe => "VRECPE",
    vrecps => "VRECPS",
    vrev => "VREV",
    vrhadd => "VRHADD",
    vrshl => "VRSHL",
    vrshr => "VRSHR",
    vrshrn => "VRSHRN",
    vrsqrte => "VRSQRTE",
    vrsqrts => "VRSQRTS",
    vrsra => "VRSRA",
    vrsubhn => "VRSUBHN",
    vshl_imm => "VSHL_IMM",
    vshl_reg => "VSHL_REG",
    vshll => "VSHLL",
    vshr => "VSHR",
    vshrn => "VSHRN",
    vsli => "VSLI",
    vsqrt => "VSQRT",
    vsra => "VSRA",
    vsri => "VSRI",
    vst_multi => "VST_MULTI",
    vst1_single => "VST1_SINGLE",
    vst2_single => "VST2_SINGLE",
    vst3_single => "VST3_SINGLE",
    vst4_single => "VST4_SINGLE",
    vstm => "VSTM",
    vstr => "VSTR",
    vsub => "VSUB",
    vsub_fp => "VSUB_FP",
    vsub_lw => "VSUB_LW",
    vsubhn => "VSUBHN",
    vswp => "VSWP",
    vtb => "VTB",
    vtrn => "VTRN",
    vtst => "VTST",
    vuzp => "VUZP",
    vzip => "VZIP",
}
