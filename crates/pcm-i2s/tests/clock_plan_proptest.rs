//! Property-based tests for bit-clock planning.
//! The divider must reproduce every target exactly on the oscillator path and
//! within one part in 4096 on the PLL path.
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use pcm_i2s::{ClockPlan, MashStage};
use platform::clock_config::{OSCILLATOR_HZ, PLLD_HZ};
use platform::{ClockSource, SampleRateHz, SampleWidth};

/// 48 kHz, 16-bit, full master: oscillator divided by 8, no MASH.
#[test]
fn cd_rate_on_oscillator() {
    let rate = SampleRateHz::new(48_000).unwrap();
    let plan = ClockPlan::for_stream(SampleWidth::S16, rate, None, true);
    assert_eq!(plan.target_hz, 2_400_000);
    assert_eq!(plan.source, ClockSource::Oscillator);
    assert_eq!(plan.divider.integer_part, 8);
    assert_eq!(plan.divider.fractional_part, 0);
    assert_eq!(plan.mash, MashStage::Integer);
}

/// 44.1 kHz at the 32-bit default ratio cannot come from 19.2 MHz.
#[test]
fn cd_44k1_needs_pll() {
    let plan = ClockPlan::plan(44_100 * 100, 100, true);
    assert_eq!(plan.target_hz, 4_410_000);
    assert_eq!(plan.source, ClockSource::PllD);
    assert_eq!(plan.mash, MashStage::Stage1);
    assert_eq!(plan.divider.integer_part, 113);
    assert_eq!(plan.divider.fractional_part, 1551);
}

/// Every 8 kHz multiple with the default 16-bit ratio stays on the oscillator.
#[test]
fn multiples_of_8k_stay_integer() {
    for hz in [8_000, 16_000, 32_000, 48_000, 64_000, 96_000] {
        let plan = ClockPlan::for_stream(SampleWidth::S16, SampleRateHz::new(hz).unwrap(), None, true);
        assert!(plan.is_exact(), "{hz} Hz should divide 19.2 MHz");
        assert_eq!(plan.bclk_ratio, 50);
    }
}

proptest::proptest! {
    /// Oscillator path: exact integer divider whenever the target divides 19.2 MHz.
    #[test]
    fn integer_mode_is_exact(divisor in 2u32..=4095) {
        let target = OSCILLATOR_HZ / divisor;
        proptest::prop_assume!(OSCILLATOR_HZ % target == 0);
        let plan = ClockPlan::plan(target, 64, true);
        proptest::prop_assert_eq!(plan.source, ClockSource::Oscillator);
        proptest::prop_assert_eq!(plan.divider.fractional_part, 0);
        proptest::prop_assert_eq!(plan.mash, MashStage::Integer);
        proptest::prop_assert_eq!(plan.divider.integer_part * target, OSCILLATOR_HZ);
    }

    /// PLL path: fraction in range and output within 1/4096 of the target.
    #[test]
    fn pll_mode_error_bound(target in 122_071u32..=50_000_000) {
        proptest::prop_assume!(OSCILLATOR_HZ % target != 0);
        let plan = ClockPlan::plan(target, 64, true);
        proptest::prop_assert_eq!(plan.source, ClockSource::PllD);
        proptest::prop_assert!(plan.divider.fractional_part <= 4095);
        proptest::prop_assert!(plan.divider.fits_register());

        let actual = u64::from(plan.reconstructed_hz());
        let target = u64::from(target);
        let error = actual.abs_diff(target);
        proptest::prop_assert!(error * 4096 <= target, "{} Hz vs {} Hz", actual, target);
    }

    /// Anything short of full master skips the oscillator.
    #[test]
    fn partial_master_always_uses_pll(target in 16_000u32..=24_000_000) {
        let plan = ClockPlan::plan(target, 64, false);
        proptest::prop_assert_eq!(plan.source, ClockSource::PllD);
        let expected = (u64::from(PLLD_HZ) << 12) / u64::from(target);
        proptest::prop_assert_eq!(plan.divider.scaled(), expected);
    }

    /// Stream plans never fall below two full-width slots per frame.
    #[test]
    fn stream_ratio_holds_both_slots(hz in 8_000u32..=384_000, width_index in 0usize..3) {
        let width = SampleWidth::ALL[width_index];
        let plan = ClockPlan::for_stream(width, SampleRateHz::new(hz).unwrap(), None, true);
        proptest::prop_assert!(plan.bclk_ratio >= 2 * width.bits());
        proptest::prop_assert_eq!(plan.target_hz, hz * plan.bclk_ratio);
    }
}
