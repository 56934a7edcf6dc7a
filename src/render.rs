use crate::config::RenderConfig;
use crate::layout::{Bounds, Drawing, Entity, LinearDimension, Page, RectShape, TextAlign, TextShape};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// One page as an SVG sized like the printed sheet.
pub fn render_page_svg(drawing: &Drawing, page: &Page, theme: &Theme) -> String {
    let mut svg = svg_open(page.bounds(), drawing.paper_width, drawing.paper_height, theme);
    push_page(&mut svg, drawing, page, theme);
    svg.push_str("</svg>");
    svg
}

/// Every page in one SVG, laid out as in model space.
pub fn render_sheet_svg(drawing: &Drawing, theme: &Theme) -> String {
    let bounds = drawing
        .bounds()
        .unwrap_or_else(|| Bounds::from_rect(0.0, 0.0, drawing.paper_width, drawing.paper_height));
    let scale = drawing.scale.max(f32::EPSILON);
    let mut svg = svg_open(
        bounds,
        bounds.width() / scale,
        bounds.height() / scale,
        theme,
    );
    for page in &drawing.pages {
        push_page(&mut svg, drawing, page, theme);
    }
    svg.push_str("</svg>");
    svg
}

fn svg_open(bounds: Bounds, width_mm: f32, height_mm: f32, theme: &Theme) -> String {
    let mut svg = String::new();
    // Model Y points up; SVG Y points down, so every y is negated.
    let (x, y, w, h) = (bounds.min_x, -bounds.max_y, bounds.width(), bounds.height());
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width_mm:.2}mm\" height=\"{height_mm:.2}mm\" viewBox=\"{x:.2} {y:.2} {w:.2} {h:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" fill=\"{}\"/>",
        theme.background
    ));
    svg
}

fn push_page(svg: &mut String, drawing: &Drawing, page: &Page, theme: &Theme) {
    let stroke_width = theme.stroke_width * drawing.scale;
    svg.push_str(&format!(
        "<g id=\"page-{}\" stroke-width=\"{stroke_width:.2}\" font-family=\"{}\">",
        escape_xml(&page.layout_name),
        escape_xml(&theme.font_family)
    ));
    for entity in &page.entities {
        match entity {
            Entity::Rect(rect) => svg.push_str(&rect_svg(rect, theme)),
            Entity::Text(text) => svg.push_str(&text_svg(text, theme)),
            Entity::Dimension(dim) => svg.push_str(&dimension_svg(dim, theme)),
        }
    }
    svg.push_str("</g>");
}

fn rect_svg(rect: &RectShape, theme: &Theme) -> String {
    format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{}\"/>",
        rect.x,
        -(rect.y + rect.height),
        rect.width,
        rect.height,
        theme.pen(rect.pen).color
    )
}

fn text_svg(text: &TextShape, theme: &Theme) -> String {
    let x = text.position.x;
    let y = -text.position.y;
    let font_size = text.height / theme.cap_height_ratio.max(0.1);
    let (anchor, baseline) = match text.align {
        TextAlign::BottomLeft => ("start", "alphabetic"),
        TextAlign::BottomCenter => ("middle", "alphabetic"),
        TextAlign::MiddleLeft => ("start", "central"),
        TextAlign::MiddleCenter => ("middle", "central"),
    };
    let transform = if text.rotation != 0.0 {
        format!(" transform=\"rotate({:.2} {x:.2} {y:.2})\"", -text.rotation)
    } else {
        String::new()
    };
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{font_size:.2}\" text-anchor=\"{anchor}\" dominant-baseline=\"{baseline}\" fill=\"{}\"{transform}>{}</text>",
        theme.pen(text.pen).color,
        escape_xml(&text.value)
    )
}

fn dimension_svg(dim: &LinearDimension, theme: &Theme) -> String {
    let geometry = dim.geometry();
    let color = &theme.pen(crate::theme::Pen::Dimension).color;
    let mut out = String::new();
    for (a, b) in &geometry.lines {
        out.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\"/>",
            a.x, -a.y, b.x, -b.y
        ));
    }
    for arrow in &geometry.arrows {
        let points: Vec<String> = arrow
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, -p.y))
            .collect();
        out.push_str(&format!(
            "<polygon points=\"{}\" fill=\"{color}\" stroke=\"none\"/>",
            points.join(" ")
        ));
    }
    out.push_str(&text_svg(&geometry.text, theme));
    out
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let zoom = render_cfg.dpi / 96.0;
    let size = tree.size().to_int_size();
    let width = (size.width() as f32 * zoom).ceil() as u32;
    let height = (size.height() as f32 * zoom).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate {width}x{height} pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(zoom, zoom),
        &mut pixmap_mut,
    );
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
