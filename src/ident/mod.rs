//! Frequency-to-satellite classification against a curated transponder
//! table. Identification is best-effort: no match is a normal outcome.

/// Fractional band widening absorbing Doppler shift and oscillator error for
/// LEO satellites (±0.0035%).
pub const DOPPLER_TOLERANCE: f64 = 0.000035;

#[derive(Debug, Clone, Copy)]
pub struct Transponder {
    pub name: &'static str,
    /// Downlink band in Hz, inclusive of both edges before widening.
    pub downlink_hz: (i64, i64),
    /// Uplink band in Hz.
    pub uplink_hz: (i64, i64),
}

/// Known transponders. Order is the tie-break: the first matching entry wins,
/// so entries with identical bands (e.g. CAS-4A and XW-2D) must stay curated.
pub static SATELLITES: &[Transponder] = &[
    Transponder { name: "AO-7", downlink_hz: (145_925_000, 145_975_000), uplink_hz: (432_125_000, 432_175_000) },
    Transponder { name: "AO-27", downlink_hz: (436_798_000, 436_798_000), uplink_hz: (145_850_000, 145_850_000) },
    Transponder { name: "AO-73", downlink_hz: (145_950_000, 145_970_000), uplink_hz: (435_130_000, 435_150_000) },
    Transponder { name: "AO-91", downlink_hz: (145_960_000, 145_960_000), uplink_hz: (435_250_000, 435_250_000) },
    Transponder { name: "AO-92", downlink_hz: (145_880_000, 145_880_000), uplink_hz: (435_350_000, 435_350_000) },
    Transponder { name: "AO-109", downlink_hz: (435_760_000, 435_790_000), uplink_hz: (145_860_000, 145_890_000) },
    Transponder { name: "ARISS", downlink_hz: (437_800_000, 437_800_000), uplink_hz: (145_990_000, 145_990_000) },
    Transponder { name: "CAS-3H", downlink_hz: (437_200_000, 437_200_000), uplink_hz: (144_350_000, 144_350_000) },
    Transponder { name: "CAS-4A", downlink_hz: (145_860_000, 145_880_000), uplink_hz: (435_210_000, 435_230_000) },
    Transponder { name: "CAS-4B", downlink_hz: (145_915_000, 145_935_000), uplink_hz: (435_270_000, 435_290_000) },
    Transponder { name: "FO-118", downlink_hz: (435_525_000, 435_555_000), uplink_hz: (145_805_000, 145_835_000) },
    Transponder { name: "EO-88", downlink_hz: (145_960_000, 145_990_000), uplink_hz: (435_015_000, 435_045_000) },
    Transponder { name: "FO-29", downlink_hz: (435_800_000, 435_900_000), uplink_hz: (145_900_000, 146_000_000) },
    Transponder { name: "FO-99", downlink_hz: (435_880_000, 435_910_000), uplink_hz: (145_900_000, 145_930_000) },
    Transponder { name: "HO-113", downlink_hz: (435_165_000, 435_195_000), uplink_hz: (145_855_000, 145_885_000) },
    Transponder { name: "IO-86", downlink_hz: (435_880_000, 435_880_000), uplink_hz: (145_880_000, 145_880_000) },
    Transponder { name: "IO-117", downlink_hz: (435_310_000, 435_310_000), uplink_hz: (435_310_000, 435_310_000) },
    Transponder { name: "JO-97", downlink_hz: (145_855_000, 145_875_000), uplink_hz: (435_100_000, 435_120_000) },
    Transponder { name: "PO-101", downlink_hz: (145_900_000, 145_900_000), uplink_hz: (437_500_000, 437_500_000) },
    Transponder { name: "RS-44", downlink_hz: (435_610_000, 435_670_000), uplink_hz: (145_935_000, 145_995_000) },
    Transponder { name: "SO-50", downlink_hz: (436_795_000, 436_795_000), uplink_hz: (145_850_000, 145_850_000) },
    Transponder { name: "TO-108", downlink_hz: (145_915_000, 145_935_000), uplink_hz: (435_270_000, 435_290_000) },
    Transponder { name: "UVSQ", downlink_hz: (437_020_000, 437_020_000), uplink_hz: (145_905_000, 145_905_000) },
    Transponder { name: "XW-2A", downlink_hz: (145_665_000, 145_685_000), uplink_hz: (435_030_000, 435_050_000) },
    Transponder { name: "XW-2B", downlink_hz: (145_730_000, 145_750_000), uplink_hz: (435_090_000, 435_110_000) },
    Transponder { name: "XW-2C", downlink_hz: (145_795_000, 145_815_000), uplink_hz: (435_150_000, 435_170_000) },
    Transponder { name: "XW-2D", downlink_hz: (145_860_000, 145_880_000), uplink_hz: (435_210_000, 435_230_000) },
    Transponder { name: "XW-2E", downlink_hz: (145_915_000, 145_935_000), uplink_hz: (435_518_000, 435_538_000) },
    Transponder { name: "XW-2F", downlink_hz: (145_980_000, 146_000_000), uplink_hz: (435_330_000, 435_350_000) },
];

/// Classify an observed uplink/downlink pair. Both frequencies must fall
/// inside their tolerance-widened bands; the first table entry wins.
pub fn identify(uplink_hz: i64, downlink_hz: i64) -> Option<&'static str> {
    SATELLITES
        .iter()
        .find(|t| within(uplink_hz, t.uplink_hz) && within(downlink_hz, t.downlink_hz))
        .map(|t| t.name)
}

fn within(frequency_hz: i64, band_hz: (i64, i64)) -> bool {
    let lo = band_hz.0 as f64 * (1.0 - DOPPLER_TOLERANCE);
    let hi = band_hz.1 as f64 * (1.0 + DOPPLER_TOLERANCE);
    let f = frequency_hz as f64;
    lo < f && f < hi
}
