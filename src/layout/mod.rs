mod detail;
mod paging;
mod text;
pub(crate) mod types;
pub use paging::{PageSpan, plan_pages, row_digits, row_label};
pub use types::*;

use detail::compose_detail;

use crate::config::Config;
use crate::ir::{Detail, Task};
use crate::marks::{MarkError, MarkRegistry};
use crate::theme::Pen;

/// Lays out every task, one row of pages per task, in the given order.
///
/// Model space is the plan at true size with Y up. Task `n` (1-based) has its
/// pages side by side, the row of task `n + 1` sits below it. Marks are drawn
/// from `registry` as details are placed, so the order of `tasks` decides
/// which mark each piece receives.
pub fn compute_drawing(
    tasks: &[&Task],
    registry: &mut MarkRegistry,
    config: &Config,
) -> Result<Drawing, MarkError> {
    let page = &config.page;
    let step_x = page.model(page.page_width + page.page_x_space);
    let step_y = page.model(page.page_height + page.page_y_space);
    let per_page = page.details_per_page();

    let mut pages = Vec::new();
    let mut placeholder_marks = 0;
    let mut row_y = 0.0f32;

    for (idx, task) in tasks.iter().enumerate() {
        let task_number = idx + 1;
        let spans = plan_pages(task.solution.len(), per_page);
        if spans.is_empty() {
            tracing::warn!(task = %task.name, key = %task.key, "task has no details, nothing to print");
            continue;
        }
        tracing::debug!(
            task = %task.name,
            details = task.solution.len(),
            pages = spans.len(),
            waste = task.solution.iter().map(Detail::waste).sum::<f64>(),
            "laying out task"
        );

        let digits = row_digits(task.solution.len());
        for span in spans {
            let origin = Point::new(span.index as f32 * step_x, row_y);
            let (composed, placeholders) =
                compose_page(task, task_number, span, origin, digits, registry, config)?;
            placeholder_marks += placeholders;
            pages.push(composed);
        }
        row_y -= step_y;
    }

    Ok(Drawing {
        pages,
        scale: page.global_scale,
        paper_width: page.page_width,
        paper_height: page.page_height,
        placeholder_marks,
    })
}

fn compose_page(
    task: &Task,
    task_number: usize,
    span: PageSpan,
    origin: Point,
    digits: usize,
    registry: &mut MarkRegistry,
    config: &Config,
) -> Result<(Page, usize), MarkError> {
    let page = &config.page;
    let width = page.model(page.page_width);
    let height = page.model(page.page_height);
    let mut entities = Vec::new();
    let mut marks_placed = Vec::new();
    let mut placeholders = 0;

    entities.push(Entity::Rect(RectShape {
        x: origin.x,
        y: origin.y,
        width,
        height,
        pen: Pen::Frame,
    }));
    entities.push(Entity::Rect(RectShape {
        x: origin.x + page.model(page.frame_margin_left),
        y: origin.y + page.model(page.frame_margin),
        width: width - page.model(page.frame_margin_left + page.frame_margin),
        height: height - page.model(page.frame_margin * 2.0),
        pen: Pen::Frame,
    }));

    let cursor_x = origin.x + page.model(page.title_x);
    let mut cursor_y = origin.y + page.model(page.page_height - page.title_top);

    let title = format!(
        "#{task_number} {} {} / {}",
        task.name,
        span.index + 1,
        span.count
    );
    entities.push(Entity::Text(TextShape {
        position: Point::new(cursor_x, cursor_y),
        height: page.model(page.title_height),
        rotation: 0.0,
        align: TextAlign::BottomLeft,
        value: title.clone(),
        pen: Pen::Text,
    }));

    for detail_idx in span.details() {
        let detail = &task.solution[detail_idx];
        cursor_y -= page.model(page.block_height);

        entities.push(Entity::Text(TextShape {
            position: Point::new(cursor_x, cursor_y + page.beam_height / 2.0),
            height: page.model(page.number_height),
            rotation: 0.0,
            align: TextAlign::MiddleLeft,
            value: row_label(detail_idx + 1, digits),
            pen: Pen::Text,
        }));

        let mut marks = registry.reserve_detail(&task.name, &detail.pieces, &config.marks)?;
        marks_placed.extend(compose_detail(
            Point::new(cursor_x + page.model(page.detail_indent), cursor_y),
            detail_idx + 1,
            detail,
            &mut marks,
            config,
            &mut entities,
        ));
        placeholders += marks.placeholders_used();
    }

    let composed = Page {
        layout_name: format!("{task_number}.{}", span.index + 1),
        task_number,
        task_key: task.key.clone(),
        task_name: task.name.clone(),
        number: span.index + 1,
        count: span.count,
        title,
        origin,
        width,
        height,
        rows: span.first_row()..=span.first + span.len,
        entities,
        marks: marks_placed,
    };
    Ok((composed, placeholders))
}
