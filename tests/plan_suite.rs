use std::path::{Path, PathBuf};

use cutplan::layout::{Entity, TextAlign};
use cutplan::{
    Config, DxfOptions, MarkRegistry, TaskOrder, Theme, compute_drawing, order_tasks, parse_marks,
    parse_tasks, render_dxf, render_page_svg, render_sheet_svg,
};

fn fixture(name: &str) -> String {
    let path: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).expect("fixture read failed")
}

fn plan(order: TaskOrder) -> (cutplan::Drawing, MarkRegistry) {
    let tasks = parse_tasks(&fixture("tasks.json")).expect("tasks parse failed");
    let sheet = parse_marks(&fixture("marks.json")).expect("marks parse failed");
    let ordered = order_tasks(&tasks, &order).expect("ordering failed");
    let mut registry = MarkRegistry::from_sheet(&sheet);
    let drawing = compute_drawing(&ordered, &mut registry, &Config::default()).expect("layout failed");
    (drawing, registry)
}

fn marks_on(drawing: &cutplan::Drawing, layout_name: &str) -> Vec<String> {
    let page = drawing
        .pages
        .iter()
        .find(|page| page.layout_name == layout_name)
        .expect("page missing");
    page.entities
        .iter()
        .filter_map(|entity| match entity {
            Entity::Text(text) if text.align == TextAlign::MiddleCenter => Some(text.value.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn fixture_pages_in_total_length_order() {
    let (drawing, registry) = plan(TaskOrder::TotalLength);
    let names: Vec<&str> = drawing
        .pages
        .iter()
        .map(|page| page.layout_name.as_str())
        .collect();
    assert_eq!(names, vec!["1.1", "1.2", "2.1", "3.1"]);
    assert_eq!(drawing.pages[0].task_name, "HEA200");
    assert_eq!(drawing.pages[1].rows, 9..=12);
    assert_eq!(drawing.pages[2].task_name, "IPE160");
    assert_eq!(drawing.placeholder_marks, 0);

    // Only the third L50x5 mark is left over.
    assert_eq!(registry.unused_keys(), vec![("L50x5x1200.5", 1)]);
}

#[test]
fn fixture_marks_are_consumed_from_the_back() {
    let (drawing, _) = plan(TaskOrder::TotalLength);
    let first = marks_on(&drawing, "1.1");
    assert_eq!(&first[..3], &["K12", "C23", "C24"]);
    assert_eq!(&first[3..6], &["K11", "C21", "C22"]);

    let ipe = marks_on(&drawing, "2.1");
    assert_eq!(ipe, vec!["B1", "B2", "P1", "B1"]);

    let angle = marks_on(&drawing, "3.1");
    assert_eq!(angle, vec!["A1", "L2", "L3"]);
}

#[test]
fn fixture_renders_every_format() {
    let (drawing, _) = plan(TaskOrder::Key);
    let theme = Theme::cad();
    for page in &drawing.pages {
        let svg = render_page_svg(&drawing, page, &theme);
        assert!(svg.contains("<svg"), "{}: missing <svg tag", page.layout_name);
        assert!(svg.contains("</svg>"), "{}: missing </svg tag", page.layout_name);
        assert!(svg.contains(&page.title));
    }
    let sheet = render_sheet_svg(&drawing, &theme);
    assert_eq!(sheet.matches("<g id=\"page-").count(), 4);

    let dxf = render_dxf(&drawing, &theme, DxfOptions::default());
    assert!(dxf.contains("#1 IPE160 1 / 1"));
    assert!(dxf.ends_with("  0\nEOF\n"));
}
