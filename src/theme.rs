use serde::{Deserialize, Serialize};

/// Drawing role of an entity; selects its colour and DXF layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pen {
    Frame,
    Stock,
    Piece,
    Text,
    Dimension,
}

impl Pen {
    pub const ALL: [Pen; 5] = [Pen::Frame, Pen::Stock, Pen::Piece, Pen::Text, Pen::Dimension];

    pub fn layer_name(self) -> &'static str {
        match self {
            Pen::Frame => "FRAME",
            Pen::Stock => "STOCK",
            Pen::Piece => "PIECES",
            Pen::Text => "TEXT",
            Pen::Dimension => "DIMENSIONS",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenStyle {
    /// AutoCAD colour index.
    pub aci: u8,
    pub color: String,
}

impl PenStyle {
    fn new(aci: u8, color: &str) -> Self {
        Self {
            aci,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub font_family: String,
    /// Cap height as a fraction of the em size; CAD text heights are cap heights.
    pub cap_height_ratio: f32,
    pub background: String,
    /// Stroke width in paper millimetres.
    pub stroke_width: f32,
    pub frame: PenStyle,
    pub stock: PenStyle,
    pub piece: PenStyle,
    pub text: PenStyle,
    pub dimension: PenStyle,
}

impl Theme {
    pub fn cad() -> Self {
        Self {
            name: "cad".to_string(),
            font_family: "\"DejaVu Sans\", Arial, sans-serif".to_string(),
            cap_height_ratio: 0.72,
            background: "#FFFFFF".to_string(),
            stroke_width: 0.25,
            frame: PenStyle::new(7, "#000000"),
            stock: PenStyle::new(1, "#E0201B"),
            piece: PenStyle::new(5, "#1F4FD8"),
            text: PenStyle::new(7, "#000000"),
            dimension: PenStyle::new(7, "#000000"),
        }
    }

    pub fn monochrome() -> Self {
        Self {
            name: "monochrome".to_string(),
            stock: PenStyle::new(7, "#000000"),
            piece: PenStyle::new(8, "#555555"),
            ..Self::cad()
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "cad" | "default" => Some(Self::cad()),
            "monochrome" | "mono" => Some(Self::monochrome()),
            _ => None,
        }
    }

    pub fn pen(&self, pen: Pen) -> &PenStyle {
        match pen {
            Pen::Frame => &self.frame,
            Pen::Stock => &self.stock,
            Pen::Piece => &self.piece,
            Pen::Text => &self.text,
            Pen::Dimension => &self.dimension,
        }
    }

    pub fn pen_mut(&mut self, pen: Pen) -> &mut PenStyle {
        match pen {
            Pen::Frame => &mut self.frame,
            Pen::Stock => &mut self.stock,
            Pen::Piece => &mut self.piece,
            Pen::Text => &mut self.text,
            Pen::Dimension => &mut self.dimension,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::cad()
    }
}
