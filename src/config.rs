use crate::theme::{Pen, Theme};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page geometry. Lengths are paper millimetres unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    /// Model millimetres per paper millimetre.
    pub global_scale: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub page_x_space: f32,
    pub page_y_space: f32,
    pub page_top_offset: f32,
    pub page_bottom_offset: f32,
    pub block_height: f32,
    /// Height of a drawn bar, in model units.
    pub beam_height: f32,
    pub title_x: f32,
    pub title_top: f32,
    pub title_height: f32,
    pub detail_indent: f32,
    pub number_height: f32,
    pub mark_height: f32,
    pub position_height: f32,
    pub dimension_offset: f32,
    pub position_inset: f32,
    pub frame_margin_left: f32,
    pub frame_margin: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            global_scale: 53.0,
            page_width: 297.0,
            page_height: 210.0,
            page_x_space: 20.0,
            page_y_space: 10.0,
            page_top_offset: 10.0,
            page_bottom_offset: 10.0,
            block_height: 20.0,
            beam_height: 200.0,
            title_x: 25.0,
            title_top: 15.0,
            title_height: 5.0,
            detail_indent: 5.0,
            number_height: 2.5,
            mark_height: 1.8,
            position_height: 1.6,
            dimension_offset: 7.0,
            position_inset: 0.5,
            frame_margin_left: 20.0,
            frame_margin: 5.0,
        }
    }
}

impl PageConfig {
    /// Rows of `block_height` that fit between the top and bottom offsets.
    pub fn blocks_per_page(&self) -> usize {
        let usable = self.page_height - (self.page_top_offset + self.page_bottom_offset);
        if usable <= 0.0 || self.block_height <= 0.0 {
            return 0;
        }
        (usable / self.block_height).floor() as usize
    }

    /// The first block holds the title; at least one detail always fits.
    pub fn details_per_page(&self) -> usize {
        self.blocks_per_page().saturating_sub(1).max(1)
    }

    /// Converts paper millimetres to model units.
    pub fn model(&self, paper: f32) -> f32 {
        paper * self.global_scale
    }
}

/// Dimension style, in paper millimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DimensionConfig {
    pub text_height: f32,
    pub arrow_size: f32,
    pub extension_overshoot: f32,
    pub extension_gap: f32,
    pub text_gap: f32,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            text_height: 1.6,
            arrow_size: 1.2,
            extension_overshoot: 1.0,
            extension_gap: 0.6,
            text_gap: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkConfig {
    pub placeholder: String,
    pub strict: bool,
    pub fit_to_piece: bool,
    /// Smallest fraction of the nominal height a fitted label may shrink to.
    pub min_scale: f32,
}

impl Default for MarkConfig {
    fn default() -> Self {
        Self {
            placeholder: "?".to_string(),
            strict: false,
            fit_to_piece: true,
            min_scale: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub dpi: f32,
    /// Draw rectangles as separate lines instead of closed polylines (DXF).
    pub explode_rects: bool,
    /// Page fill for SVG and PNG output; overrides the theme background.
    pub background: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            explode_rects: false,
            background: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub page: PageConfig,
    pub dimension: DimensionConfig,
    pub marks: MarkConfig,
    pub theme: Theme,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            dimension: DimensionConfig::default(),
            marks: MarkConfig::default(),
            theme: Theme::cad(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeColors {
    font_family: Option<String>,
    background: Option<String>,
    stroke_width: Option<f32>,
    frame: Option<String>,
    stock: Option<String>,
    piece: Option<String>,
    text: Option<String>,
    dimension: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_colors: Option<ThemeColors>,
    page: Option<PageConfig>,
    dimension: Option<DimensionConfig>,
    marks: Option<MarkConfig>,
    render: Option<RenderConfig>,
}

/// Loads a JSON5 config file over the defaults; no path gives the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme `{theme_name}`"))?;
    }

    if let Some(colors) = parsed.theme_colors {
        if let Some(v) = colors.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = colors.background {
            config.theme.background = v;
        }
        if let Some(v) = colors.stroke_width {
            config.theme.stroke_width = v;
        }
        let pens = [
            (Pen::Frame, colors.frame),
            (Pen::Stock, colors.stock),
            (Pen::Piece, colors.piece),
            (Pen::Text, colors.text),
            (Pen::Dimension, colors.dimension),
        ];
        for (pen, color) in pens {
            if let Some(v) = color {
                config.theme.pen_mut(pen).color = v;
            }
        }
    }

    if let Some(page) = parsed.page {
        config.page = page;
    }
    if let Some(dimension) = parsed.dimension {
        config.dimension = dimension;
    }
    if let Some(marks) = parsed.marks {
        config.marks = marks;
    }
    if let Some(render) = parsed.render {
        config.render = render;
    }
    if let Some(background) = config.render.background.clone() {
        config.theme.background = background;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> anyhow::Result<()> {
    let page = &config.page;
    if page.global_scale <= 0.0 {
        anyhow::bail!("page.globalScale must be positive");
    }
    if page.page_width <= 0.0 || page.page_height <= 0.0 {
        anyhow::bail!("page size must be positive");
    }
    if page.blocks_per_page() < 2 {
        anyhow::bail!("page holds no detail rows below the title");
    }
    if config.render.dpi <= 0.0 {
        anyhow::bail!("render.dpi must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_holds_eight_details() {
        let page = PageConfig::default();
        assert_eq!(page.blocks_per_page(), 9);
        assert_eq!(page.details_per_page(), 8);
        assert_eq!(page.model(2.0), 106.0);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_config(
            r##"{
                // JSON5 allows comments
                theme: "monochrome",
                themeColors: { piece: "#00AA00" },
                page: { globalScale: 25, blockHeight: 30 },
                marks: { placeholder: "-" },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.name, "monochrome");
        assert_eq!(config.theme.piece.color, "#00AA00");
        assert_eq!(config.page.global_scale, 25.0);
        assert_eq!(config.page.page_width, 297.0);
        assert_eq!(config.page.details_per_page(), 5);
        assert_eq!(config.marks.placeholder, "-");
        assert!(config.marks.fit_to_piece);
    }

    #[test]
    fn render_background_overrides_theme() {
        let config = parse_config(
            r##"{
                themeColors: { background: "#EEEEEE" },
                render: { background: "#123456", dpi: 300 },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.background, "#123456");
        assert_eq!(config.render.dpi, 300.0);

        let config = parse_config(r##"{ themeColors: { background: "#EEEEEE" } }"##).unwrap();
        assert_eq!(config.theme.background, "#EEEEEE");
        assert_eq!(config.render.background, None);
    }

    #[test]
    fn rejects_unusable_page() {
        assert!(parse_config(r#"{ page: { blockHeight: 200 } }"#).is_err());
        assert!(parse_config(r#"{ theme: "neon" }"#).is_err());
    }
}
