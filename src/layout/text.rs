use crate::config::MarkConfig;
use crate::text_metrics;
use crate::theme::Theme;

/// Share of the available width a label may fill.
const FILL_RATIO: f32 = 0.9;

/// Width of a label set at cap height `height`, in the same units.
pub(super) fn label_width(text: &str, height: f32, theme: &Theme) -> f32 {
    let em = height / theme.cap_height_ratio.max(0.1);
    text_metrics::estimate_text_width(text, em, &theme.font_family)
}

/// Cap height for a label drawn inside `available` width: the nominal
/// height, shrunk when the label would overflow, never below
/// `config.min_scale` of the nominal.
pub(super) fn fit_label_height(
    text: &str,
    height: f32,
    available: f32,
    theme: &Theme,
    config: &MarkConfig,
) -> f32 {
    if !config.fit_to_piece || text.is_empty() || available <= 0.0 {
        return height;
    }
    let width = label_width(text, height, theme);
    let room = available * FILL_RATIO;
    if width <= room {
        return height;
    }
    let floor = height * config.min_scale.clamp(0.0, 1.0);
    (height * room / width).max(floor)
}
