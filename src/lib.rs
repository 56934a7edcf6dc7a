#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dxf;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod marks;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use dxf::{DxfOptions, render_dxf};
pub use layout::{Drawing, compute_drawing};
pub use marks::{MarkError, MarkRegistry};
pub use parser::{InputError, TaskOrder, order_tasks, parse_marks, parse_tasks};
pub use render::{render_page_svg, render_sheet_svg};
pub use theme::Theme;
