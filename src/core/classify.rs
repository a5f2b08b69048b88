pub const BAND_COUNT: usize = 8;

/// Upper edges are inclusive: a value equal to a breakpoint stays in the lower band.
pub const TIME_BREAKS: [f64; BAND_COUNT + 1] =
    [0.0, 15.0, 30.0, 45.0, 60.0, 90.0, 120.0, 180.0, f64::INFINITY];

pub const BAND_LABELS: [&str; BAND_COUNT] = [
    "15分以内",
    "15-30分",
    "30-45分",
    "45-60分",
    "60-90分",
    "90-120分",
    "120-180分",
    "180分超",
];

pub const BAND_COLORS: [&str; BAND_COUNT] = [
    "#2166ac", "#4393c3", "#92c5de", "#fddbc7", "#f4a582", "#d6604d", "#b2182b", "#67001f",
];

pub fn classify(minutes: f64) -> usize {
    TIME_BREAKS[1..]
        .iter()
        .position(|&upper| minutes <= upper)
        .unwrap_or(BAND_COUNT - 1)
}

pub fn band_label(band: usize) -> &'static str {
    BAND_LABELS[band.min(BAND_COUNT - 1)]
}

pub fn band_color(band: usize) -> &'static str {
    BAND_COLORS[band.min(BAND_COUNT - 1)]
}
