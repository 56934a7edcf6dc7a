//! AutoCAD R12 ASCII DXF output.
//!
//! All pages go to model space at true size. Dimensions are written
//! exploded, the way a CAD program renders them into plain geometry.

use crate::layout::{Bounds, Drawing, Entity, Point, RectShape, TextAlign, TextShape};
use crate::theme::{Pen, Theme};
use std::fmt::Display;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct DxfOptions {
    /// Write rectangles as four LINEs instead of a closed POLYLINE.
    pub explode_rects: bool,
}

pub fn render_dxf(drawing: &Drawing, theme: &Theme, options: DxfOptions) -> String {
    let mut dxf = DxfWriter::default();
    let bounds = drawing
        .bounds()
        .unwrap_or_else(|| Bounds::from_rect(0.0, 0.0, 0.0, 0.0));

    dxf.section("HEADER");
    dxf.pair(9, "$ACADVER");
    dxf.pair(1, "AC1009");
    dxf.pair(9, "$DWGCODEPAGE");
    dxf.pair(3, "ANSI_1252");
    dxf.pair(9, "$EXTMIN");
    dxf.point(10, Point::new(bounds.min_x, bounds.min_y));
    dxf.pair(9, "$EXTMAX");
    dxf.point(10, Point::new(bounds.max_x, bounds.max_y));
    dxf.end_section();

    dxf.section("TABLES");
    dxf.table("LTYPE", 1);
    dxf.pair(0, "LTYPE");
    dxf.pair(2, "CONTINUOUS");
    dxf.pair(70, 0);
    dxf.pair(3, "Solid line");
    dxf.pair(72, 65);
    dxf.pair(73, 0);
    dxf.pair(40, "0.0");
    dxf.end_table();

    dxf.table("LAYER", Pen::ALL.len());
    for pen in Pen::ALL {
        dxf.pair(0, "LAYER");
        dxf.pair(2, pen.layer_name());
        dxf.pair(70, 0);
        dxf.pair(62, theme.pen(pen).aci);
        dxf.pair(6, "CONTINUOUS");
    }
    dxf.end_table();

    dxf.table("STYLE", 1);
    dxf.pair(0, "STYLE");
    dxf.pair(2, "STANDARD");
    dxf.pair(70, 0);
    dxf.pair(40, "0.0");
    dxf.pair(41, "1.0");
    dxf.pair(50, "0.0");
    dxf.pair(71, 0);
    dxf.pair(42, "2.5");
    dxf.pair(3, "txt");
    dxf.pair(4, "");
    dxf.end_table();
    dxf.end_section();

    dxf.section("ENTITIES");
    for page in &drawing.pages {
        for entity in &page.entities {
            match entity {
                Entity::Rect(rect) => dxf.rect(rect, theme, options),
                Entity::Text(text) => dxf.text(text, theme),
                Entity::Dimension(dim) => {
                    let geometry = dim.geometry();
                    for (a, b) in &geometry.lines {
                        dxf.line(*a, *b, Pen::Dimension, theme);
                    }
                    for arrow in &geometry.arrows {
                        dxf.solid(arrow, Pen::Dimension, theme);
                    }
                    dxf.text(&geometry.text, theme);
                }
            }
        }
    }
    dxf.end_section();
    dxf.pair(0, "EOF");
    dxf.out
}

pub fn write_output_dxf(dxf: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, dxf)?,
        None => print!("{dxf}"),
    }
    Ok(())
}

#[derive(Default)]
struct DxfWriter {
    out: String,
}

impl DxfWriter {
    fn pair(&mut self, code: u16, value: impl Display) {
        self.out.push_str(&format!("{code:>3}\n{value}\n"));
    }

    fn number(&mut self, code: u16, value: f32) {
        self.pair(code, format!("{value:.4}"));
    }

    /// Writes `code`, `code + 10` and `code + 20` for x, y and z = 0.
    fn point(&mut self, code: u16, point: Point) {
        self.number(code, point.x);
        self.number(code + 10, point.y);
        self.number(code + 20, 0.0);
    }

    fn section(&mut self, name: &str) {
        self.pair(0, "SECTION");
        self.pair(2, name);
    }

    fn end_section(&mut self) {
        self.pair(0, "ENDSEC");
    }

    fn table(&mut self, name: &str, entries: usize) {
        self.pair(0, "TABLE");
        self.pair(2, name);
        self.pair(70, entries);
    }

    fn end_table(&mut self) {
        self.pair(0, "ENDTAB");
    }

    fn entity(&mut self, kind: &str, pen: Pen, theme: &Theme) {
        self.pair(0, kind);
        self.pair(8, pen.layer_name());
        self.pair(62, theme.pen(pen).aci);
    }

    fn line(&mut self, a: Point, b: Point, pen: Pen, theme: &Theme) {
        self.entity("LINE", pen, theme);
        self.point(10, a);
        self.point(11, b);
    }

    fn rect(&mut self, rect: &RectShape, theme: &Theme, options: DxfOptions) {
        let corners = rect.corners();
        if options.explode_rects {
            for (a, b) in corners.iter().zip(corners.iter().cycle().skip(1)) {
                self.line(*a, *b, rect.pen, theme);
            }
            return;
        }
        self.entity("POLYLINE", rect.pen, theme);
        self.pair(66, 1);
        self.point(10, Point::default());
        self.pair(70, 1);
        for corner in corners {
            self.pair(0, "VERTEX");
            self.pair(8, rect.pen.layer_name());
            self.point(10, corner);
        }
        self.pair(0, "SEQEND");
        self.pair(8, rect.pen.layer_name());
    }

    fn solid(&mut self, triangle: &[Point; 3], pen: Pen, theme: &Theme) {
        self.entity("SOLID", pen, theme);
        self.point(10, triangle[0]);
        self.point(11, triangle[1]);
        self.point(12, triangle[2]);
        self.point(13, triangle[2]);
    }

    fn text(&mut self, text: &TextShape, theme: &Theme) {
        // Group 72: 0 left, 1 center. Group 73: 1 bottom, 2 middle.
        let (horizontal, vertical) = match text.align {
            TextAlign::BottomLeft => (0, 1),
            TextAlign::BottomCenter => (1, 1),
            TextAlign::MiddleLeft => (0, 2),
            TextAlign::MiddleCenter => (1, 2),
        };
        self.entity("TEXT", text.pen, theme);
        self.point(10, text.position);
        self.number(40, text.height);
        self.pair(1, sanitize(&text.value));
        if text.rotation != 0.0 {
            self.number(50, text.rotation);
        }
        self.pair(7, "STANDARD");
        self.pair(72, horizontal);
        self.point(11, text.position);
        self.pair(73, vertical);
    }
}

/// Group values are single ASCII lines; other characters are written as
/// `\U+XXXX` escapes, which R12 readers decode regardless of code page.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\r' | '\n' => out.push(' '),
            ch if ch.is_ascii() => out.push(ch),
            ch => out.push_str(&format!("\\U+{:04X}", ch as u32)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::{Detail, Length, Task};
    use crate::layout::compute_drawing;
    use crate::marks::MarkRegistry;

    fn drawing_for(name: &str, mark: &str) -> Drawing {
        let task = Task {
            key: "0".to_string(),
            name: name.to_string(),
            solution: vec![Detail {
                stock: Length::new(9000.0),
                pieces: vec![Length::new(4500.0)],
            }],
        };
        let mut registry = MarkRegistry::new();
        registry.extend(&format!("{name}x4500"), [mark]);
        compute_drawing(&[&task], &mut registry, &Config::default()).unwrap()
    }

    fn drawing() -> Drawing {
        drawing_for("IPE160", "K12")
    }

    fn count(dxf: &str, kind: &str) -> usize {
        dxf.matches(&format!("  0\n{kind}\n")).count()
    }

    #[test]
    fn writes_sections_and_layers() {
        let dxf = render_dxf(&drawing(), &Theme::cad(), DxfOptions::default());
        assert!(dxf.starts_with("  0\nSECTION\n  2\nHEADER\n"));
        assert!(dxf.ends_with("  0\nEOF\n"));
        assert_eq!(count(&dxf, "SECTION"), 3);
        assert_eq!(count(&dxf, "ENDSEC"), 3);
        assert_eq!(count(&dxf, "LAYER"), Pen::ALL.len());
        assert!(dxf.contains("  2\nPIECES\n"));
        assert!(dxf.contains("AC1009"));
        assert!(dxf.contains("  9\n$DWGCODEPAGE\n  3\nANSI_1252\n"));
        assert!(!dxf.contains("$INSUNITS"));
    }

    #[test]
    fn escapes_non_ascii_text() {
        let dxf = render_dxf(&drawing_for("Балка", "Б1"), &Theme::cad(), DxfOptions::default());
        assert!(dxf.is_ascii());
        assert!(dxf.contains("  1\n#1 \\U+0411\\U+0430\\U+043B\\U+043A\\U+0430 1 / 1\n"));
        assert!(dxf.contains("  1\n\\U+04111\n"));
    }

    #[test]
    fn sanitize_flattens_lines() {
        assert_eq!(sanitize("a\nb\r"), "a b ");
        assert_eq!(sanitize("Ø20"), "\\U+00D820");
    }

    #[test]
    fn writes_entities() {
        let dxf = render_dxf(&drawing(), &Theme::cad(), DxfOptions::default());
        // Sheet border, drawing frame, stock bar and one piece.
        assert_eq!(count(&dxf, "POLYLINE"), 4);
        assert_eq!(count(&dxf, "VERTEX"), 16);
        // Title, row number, mark, cut position and dimension text.
        assert_eq!(count(&dxf, "TEXT"), 5);
        assert_eq!(count(&dxf, "SOLID"), 2);
        assert_eq!(count(&dxf, "LINE"), 3);
        assert!(dxf.contains("  1\nK12\n"));
        assert!(dxf.contains("  1\n#1 IPE160 1 / 1\n"));
    }

    #[test]
    fn exploded_rects_are_lines() {
        let options = DxfOptions {
            explode_rects: true,
        };
        let dxf = render_dxf(&drawing(), &Theme::cad(), options);
        assert_eq!(count(&dxf, "POLYLINE"), 0);
        assert_eq!(count(&dxf, "LINE"), 4 * 4 + 3);
    }
}
