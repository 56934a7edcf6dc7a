use crate::layout::{Drawing, Entity, Page, PlacedMark, TextAlign};
use crate::theme::Pen;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub scale: f32,
    pub paper: [f32; 2],
    pub bounds: Option<[f32; 4]>,
    pub placeholder_marks: usize,
    pub pages: Vec<PageDump>,
}

#[derive(Debug, Serialize)]
pub struct PageDump {
    pub layout_name: String,
    pub task_number: usize,
    pub task_key: String,
    pub task_name: String,
    pub title: String,
    pub page: usize,
    pub pages: usize,
    pub rows: [usize; 2],
    pub origin: [f32; 2],
    pub width: f32,
    pub height: f32,
    pub entities: Vec<EntityDump>,
    pub marks: Vec<MarkDump>,
}

#[derive(Debug, Serialize)]
pub struct MarkDump {
    pub row: usize,
    pub length: String,
    pub mark: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<[f64; 3]>,
}

#[derive(Debug, Serialize)]
pub struct EntityDump {
    pub kind: &'static str,
    pub pen: Pen,
    pub points: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

impl LayoutDump {
    pub fn from_drawing(drawing: &Drawing) -> Self {
        LayoutDump {
            scale: drawing.scale,
            paper: [drawing.paper_width, drawing.paper_height],
            bounds: drawing
                .bounds()
                .map(|b| [b.min_x, b.min_y, b.max_x, b.max_y]),
            placeholder_marks: drawing.placeholder_marks,
            pages: drawing.pages.iter().map(PageDump::from_page).collect(),
        }
    }
}

impl PageDump {
    fn from_page(page: &Page) -> Self {
        PageDump {
            layout_name: page.layout_name.clone(),
            task_number: page.task_number,
            task_key: page.task_key.clone(),
            task_name: page.task_name.clone(),
            title: page.title.clone(),
            page: page.number,
            pages: page.count,
            rows: [*page.rows.start(), *page.rows.end()],
            origin: [page.origin.x, page.origin.y],
            width: page.width,
            height: page.height,
            entities: page.entities.iter().map(EntityDump::from_entity).collect(),
            marks: page.marks.iter().map(MarkDump::from_placed).collect(),
        }
    }
}

impl MarkDump {
    fn from_placed(placed: &PlacedMark) -> Self {
        MarkDump {
            row: placed.row,
            length: placed.length.clone(),
            mark: placed.mark.mark.clone(),
            profile: placed.mark.profile.clone(),
            start: placed.mark.start,
            end: placed.mark.end,
        }
    }
}

impl EntityDump {
    fn from_entity(entity: &Entity) -> Self {
        let mut dump = EntityDump {
            kind: entity.kind(),
            pen: entity.pen(),
            points: Vec::new(),
            text: None,
            height: None,
            rotation: None,
            align: None,
        };
        match entity {
            Entity::Rect(rect) => {
                dump.points = rect.corners().iter().map(|p| [p.x, p.y]).collect();
            }
            Entity::Text(text) => {
                dump.points = vec![[text.position.x, text.position.y]];
                dump.text = Some(text.value.clone());
                dump.height = Some(text.height);
                dump.rotation = Some(text.rotation);
                dump.align = Some(align_name(text.align).to_string());
            }
            Entity::Dimension(dim) => {
                dump.points = vec![
                    [dim.start.x, dim.start.y],
                    [dim.end.x, dim.end.y],
                    [dim.start.x, dim.line_y],
                ];
                dump.text = Some(dim.text.clone());
                dump.height = Some(dim.text_height);
            }
        }
        dump
    }
}

fn align_name(align: TextAlign) -> &'static str {
    match align {
        TextAlign::BottomLeft => "bottom-left",
        TextAlign::BottomCenter => "bottom-center",
        TextAlign::MiddleLeft => "middle-left",
        TextAlign::MiddleCenter => "middle-center",
    }
}

pub fn write_layout_dump(path: &Path, drawing: &Drawing) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_drawing(drawing);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
