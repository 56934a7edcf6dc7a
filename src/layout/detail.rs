use crate::config::Config;
use crate::ir::{Detail, Length, format_length};
use crate::marks::DetailMarks;
use crate::theme::Pen;

use super::text::fit_label_height;
use super::{Entity, LinearDimension, PlacedMark, Point, RectShape, TextAlign, TextShape};

/// Draws one stock bar with its pieces, longest first, starting at `origin`
/// (bottom left of the bar). Returns the marks drawn, tagged with `row`.
pub(super) fn compose_detail(
    origin: Point,
    row: usize,
    detail: &Detail,
    marks: &mut DetailMarks,
    config: &Config,
    out: &mut Vec<Entity>,
) -> Vec<PlacedMark> {
    let page = &config.page;
    let beam = page.beam_height;

    out.push(Entity::Rect(RectShape {
        x: origin.x,
        y: origin.y,
        width: detail.stock.as_f32(),
        height: beam,
        pen: Pen::Stock,
    }));

    let mut pieces: Vec<&Length> = detail.pieces.iter().collect();
    pieces.sort_by(|a, b| b.value().total_cmp(&a.value()));

    let dim_y = origin.y - page.model(page.dimension_offset);
    let inset = page.model(page.position_inset);
    let mut cursor = origin.x;
    let mut cut_at = 0.0f64;
    let mut placed = Vec::with_capacity(detail.pieces.len());

    for piece in pieces {
        let width = piece.as_f32();
        out.push(Entity::Rect(RectShape {
            x: cursor,
            y: origin.y,
            width,
            height: beam,
            pen: Pen::Piece,
        }));

        out.push(Entity::Dimension(dimension(
            Point::new(cursor, origin.y),
            Point::new(cursor + width, origin.y),
            dim_y,
            format_length(piece.value()),
            config,
        )));

        let mark = marks.next_for(piece);
        let nominal = page.model(page.mark_height);
        let mark_height = fit_label_height(&mark.mark, nominal, width, &config.theme, &config.marks);
        if mark_height < nominal {
            tracing::trace!(mark = %mark.mark, piece = piece.text(), "mark label shrunk to fit");
        }
        out.push(Entity::Text(TextShape {
            position: Point::new(cursor + width / 2.0, origin.y + beam / 2.0),
            height: mark_height,
            rotation: 0.0,
            align: TextAlign::MiddleCenter,
            value: mark.mark.clone(),
            pen: Pen::Text,
        }));
        placed.push(PlacedMark {
            row,
            length: piece.text().to_string(),
            mark,
        });

        // Cut position from the bar start.
        cut_at += piece.value();
        cursor += width;
        out.push(Entity::Text(TextShape {
            position: Point::new(cursor - inset, dim_y + inset),
            height: page.model(page.position_height),
            rotation: 90.0,
            align: TextAlign::BottomLeft,
            value: format_length(cut_at),
            pen: Pen::Text,
        }));
    }
    placed
}

fn dimension(start: Point, end: Point, line_y: f32, text: String, config: &Config) -> LinearDimension {
    let page = &config.page;
    let style = &config.dimension;
    LinearDimension {
        start,
        end,
        line_y,
        text,
        text_height: page.model(style.text_height),
        arrow_size: page.model(style.arrow_size),
        extension_overshoot: page.model(style.extension_overshoot),
        extension_gap: page.model(style.extension_gap),
        text_gap: page.model(style.text_gap),
    }
}
