use crate::ir::MarkInstance;
use crate::theme::Pen;

/// A model-space point: true-size millimetres, Y up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    BottomLeft,
    BottomCenter,
    MiddleLeft,
    MiddleCenter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub pen: Pen,
}

impl RectShape {
    /// Corners counter-clockwise from the bottom left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y),
            Point::new(self.x + self.width, self.y + self.height),
            Point::new(self.x, self.y + self.height),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub position: Point,
    /// Cap height in model units.
    pub height: f32,
    /// Counter-clockwise, degrees.
    pub rotation: f32,
    pub align: TextAlign,
    pub value: String,
    pub pen: Pen,
}

/// A horizontal linear dimension measuring `start.x..end.x`.
///
/// Style lengths are already in model units.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDimension {
    pub start: Point,
    pub end: Point,
    pub line_y: f32,
    pub text: String,
    pub text_height: f32,
    pub arrow_size: f32,
    pub extension_overshoot: f32,
    pub extension_gap: f32,
    pub text_gap: f32,
}

/// Primitive geometry a dimension is drawn with.
#[derive(Debug, Clone)]
pub struct DimensionGeometry {
    pub lines: Vec<(Point, Point)>,
    pub arrows: Vec<[Point; 3]>,
    pub text: TextShape,
}

impl LinearDimension {
    pub fn geometry(&self) -> DimensionGeometry {
        let (left, right) = if self.start.x <= self.end.x {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        let below = self.line_y < left.y.min(right.y);
        let dir = if below { -1.0 } else { 1.0 };

        let extension = |from: Point| {
            (
                Point::new(from.x, from.y + dir * self.extension_gap),
                Point::new(from.x, self.line_y + dir * self.extension_overshoot),
            )
        };
        let a = Point::new(left.x, self.line_y);
        let b = Point::new(right.x, self.line_y);
        let half = self.arrow_size / 6.0;
        let arrows = vec![
            [
                a,
                Point::new(a.x + self.arrow_size, a.y + half),
                Point::new(a.x + self.arrow_size, a.y - half),
            ],
            [
                b,
                Point::new(b.x - self.arrow_size, b.y + half),
                Point::new(b.x - self.arrow_size, b.y - half),
            ],
        ];

        DimensionGeometry {
            lines: vec![extension(left), extension(right), (a, b)],
            arrows,
            text: TextShape {
                position: Point::new((a.x + b.x) / 2.0, self.line_y + self.text_gap),
                height: self.text_height,
                rotation: 0.0,
                align: TextAlign::BottomCenter,
                value: self.text.clone(),
                pen: Pen::Dimension,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Rect(RectShape),
    Text(TextShape),
    Dimension(LinearDimension),
}

impl Entity {
    pub fn pen(&self) -> Pen {
        match self {
            Entity::Rect(rect) => rect.pen,
            Entity::Text(text) => text.pen,
            Entity::Dimension(_) => Pen::Dimension,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Rect(_) => "rect",
            Entity::Text(_) => "text",
            Entity::Dimension(_) => "dimension",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// A mark as drawn on a page, with what the marks document recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMark {
    pub row: usize,
    /// Piece length as keyed in the marks document.
    pub length: String,
    pub mark: MarkInstance,
}

/// One printed sheet: a page of one task's solution.
#[derive(Debug, Clone)]
pub struct Page {
    /// `"{task number}.{page number}"`.
    pub layout_name: String,
    /// 1-based position of the task in print order.
    pub task_number: usize,
    pub task_key: String,
    pub task_name: String,
    pub number: usize,
    pub count: usize,
    pub title: String,
    /// Bottom-left corner in model space.
    pub origin: Point,
    pub width: f32,
    pub height: f32,
    /// 1-based row numbers of the details drawn on this page.
    pub rows: std::ops::RangeInclusive<usize>,
    pub entities: Vec<Entity>,
    /// Marks in drawing order, longest piece first within a row.
    pub marks: Vec<PlacedMark>,
}

impl Page {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_rect(self.origin.x, self.origin.y, self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct Drawing {
    pub pages: Vec<Page>,
    pub scale: f32,
    /// Paper size of one page, millimetres.
    pub paper_width: f32,
    pub paper_height: f32,
    pub placeholder_marks: usize,
}

impl Drawing {
    pub fn bounds(&self) -> Option<Bounds> {
        self.pages
            .iter()
            .map(Page::bounds)
            .reduce(Bounds::union)
    }

    pub fn entity_count(&self) -> usize {
        self.pages.iter().map(|page| page.entities.len()).sum()
    }
}
