use crate::config::{Config, load_config};
use crate::dxf::{DxfOptions, render_dxf, write_output_dxf};
use crate::ir::MarkSheet;
use crate::layout::{Drawing, Page, compute_drawing};
use crate::layout_dump::write_layout_dump;
use crate::marks::MarkRegistry;
use crate::parser::{TaskOrder, order_tasks, parse_marks, parse_tasks};
use crate::render::{render_page_svg, render_sheet_svg, write_output_png, write_output_svg};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cutplan", version, about = "Cutting plan drawings for cut-to-length stock")]
pub struct Args {
    /// Tasks JSON file or '-' for stdin
    #[arg(short = 't', long = "tasks")]
    pub tasks: Option<PathBuf>,

    /// Marks JSON file; without it every piece gets the placeholder mark
    #[arg(short = 'm', long = "marks")]
    pub marks: Option<PathBuf>,

    /// Output file or directory. Defaults to stdout for single SVG/DXF output.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Write all pages into one SVG/PNG instead of one file per page
    #[arg(long = "sheet")]
    pub sheet: bool,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Model millimetres per paper millimetre
    #[arg(long = "scale")]
    pub scale: Option<f32>,

    /// Task print order: total-length, key, input, or a comma separated key list
    #[arg(long = "order", default_value = "total-length")]
    pub order: String,

    /// Fail instead of printing placeholders when marks run out
    #[arg(long = "strict-marks")]
    pub strict_marks: bool,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Dxf,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Dxf => "dxf",
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        if scale <= 0.0 {
            anyhow::bail!("--scale must be positive");
        }
        config.page.global_scale = scale;
    }
    if args.strict_marks {
        config.marks.strict = true;
    }

    let sheet = match args.marks.as_deref() {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading marks {}", path.display()))?;
            parse_marks(&contents).with_context(|| format!("parsing marks {}", path.display()))?
        }
        None => MarkSheet::default(),
    };
    let tasks = parse_tasks(&read_input(args.tasks.as_deref())?).context("parsing tasks")?;
    if tasks.is_empty() {
        return Err(anyhow::anyhow!("No tasks found in input"));
    }

    let order: TaskOrder = args.order.parse()?;
    let ordered = order_tasks(&tasks, &order)?;
    let mut registry = MarkRegistry::from_sheet(&sheet);
    tracing::info!(
        tasks = ordered.len(),
        pieces = ordered.iter().map(|task| task.piece_count()).sum::<usize>(),
        marks = sheet.len(),
        "computing layout"
    );
    let drawing = compute_drawing(&ordered, &mut registry, &config)?;
    report_marks(&drawing, &registry);

    if drawing.pages.is_empty() {
        return Err(anyhow::anyhow!("No details to print"));
    }
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &drawing)?;
    }
    write_drawing(&drawing, &args, &config)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cutplan={level}")));
    // SVG and DXF may go to stdout, so logs stay on stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Logs placeholder use and leftover marks; returns the number of marks
/// never consumed.
fn report_marks(drawing: &Drawing, registry: &MarkRegistry) -> usize {
    if drawing.placeholder_marks > 0 {
        tracing::warn!(
            count = drawing.placeholder_marks,
            "pieces printed without a recorded mark"
        );
    }
    let remaining = registry.remaining();
    if remaining > 0 {
        for (key, left) in registry.unused_keys() {
            tracing::warn!(key, left, "marks left unused");
        }
        tracing::warn!(remaining, "marks left unused in total");
    }
    remaining
}

fn write_drawing(drawing: &Drawing, args: &Args, config: &Config) -> Result<()> {
    let theme = &config.theme;
    let output = args.output.as_deref();

    if args.output_format == OutputFormat::Dxf {
        let options = DxfOptions {
            explode_rects: config.render.explode_rects,
        };
        return write_output_dxf(&render_dxf(drawing, theme, options), output);
    }

    if args.sheet || drawing.pages.len() == 1 {
        let svg = if args.sheet {
            render_sheet_svg(drawing, theme)
        } else {
            render_page_svg(drawing, &drawing.pages[0], theme)
        };
        return match args.output_format {
            OutputFormat::Png => {
                let output = ensure_output(output, "png")?;
                write_output_png(&svg, &output, &config.render)
            }
            _ => write_output_svg(&svg, output),
        };
    }

    let outputs = resolve_page_outputs(output, args.output_format, &drawing.pages)?;
    for (page, path) in drawing.pages.iter().zip(&outputs) {
        let svg = render_page_svg(drawing, page, theme);
        match args.output_format {
            OutputFormat::Png => write_output_png(&svg, path, &config.render)?,
            _ => write_output_svg(&svg, Some(path))?,
        }
        tracing::info!(page = %page.layout_name, path = %path.display(), "page written");
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading tasks {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

/// One file per page: `{dir}/{layout}.{ext}` when the output is a
/// directory, `{stem}-{layout}.{ext}` beside it otherwise.
fn resolve_page_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    pages: &[Page],
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output
        .ok_or_else(|| anyhow::anyhow!("Output path required for multi-page output"))?;
    if base.is_dir() {
        return Ok(pages
            .iter()
            .map(|page| base.join(format!("{}.{}", page.layout_name, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("plan");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok(pages
        .iter()
        .map(|page| parent.join(format!("{}-{}.{}", stem, page.layout_name, ext)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Detail, Length, Task};

    fn task(details: usize) -> Task {
        Task {
            key: "0".to_string(),
            name: "HEA".to_string(),
            solution: (0..details)
                .map(|_| Detail {
                    stock: Length::new(6000.0),
                    pieces: vec![Length::new(1000.0)],
                })
                .collect(),
        }
    }

    fn drawing(details: usize) -> Drawing {
        let mut registry = MarkRegistry::new();
        compute_drawing(&[&task(details)], &mut registry, &Config::default()).unwrap()
    }

    fn pages() -> Vec<Page> {
        drawing(9).pages
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["cutplan", "-t", "tasks.json"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cutplan-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn single_page_svg_goes_to_stdout_or_the_given_file() {
        let drawing = drawing(3);
        let config = Config::default();
        write_drawing(&drawing, &args(&[]), &config).unwrap();

        let dir = scratch_dir("single");
        let path = dir.join("plan.svg");
        let path_arg = path.to_string_lossy().into_owned();
        write_drawing(&drawing, &args(&["-o", &path_arg]), &config).unwrap();
        assert_eq!(file_names(&dir), vec!["plan.svg"]);
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<svg"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn multi_page_svg_writes_one_file_per_page() {
        let drawing = drawing(9);
        let config = Config::default();
        assert!(write_drawing(&drawing, &args(&[]), &config).is_err());

        let dir = scratch_dir("pages");
        let dir_arg = dir.to_string_lossy().into_owned();
        write_drawing(&drawing, &args(&["-o", &dir_arg]), &config).unwrap();
        assert_eq!(file_names(&dir), vec!["1.1.svg", "1.2.svg"]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn multi_page_dxf_is_one_document() {
        let drawing = drawing(9);
        let dir = scratch_dir("dxf");
        let path = dir.join("plan.dxf");
        let path_arg = path.to_string_lossy().into_owned();
        write_drawing(&drawing, &args(&["-e", "dxf", "-o", &path_arg]), &Config::default())
            .unwrap();
        assert_eq!(file_names(&dir), vec!["plan.dxf"]);
        let dxf = std::fs::read_to_string(&path).unwrap();
        assert!(dxf.contains("#1 HEA 1 / 2"));
        assert!(dxf.contains("#1 HEA 2 / 2"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn png_needs_an_output_path() {
        let drawing = drawing(3);
        let err = write_drawing(&drawing, &args(&["-e", "png", "--sheet"]), &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("Output path required"));
    }

    #[cfg(feature = "png")]
    #[test]
    fn sheet_png_is_one_image() {
        let drawing = drawing(9);
        let mut config = Config::default();
        config.render.dpi = 24.0;
        let dir = scratch_dir("sheet-png");
        let path = dir.join("sheet.png");
        let path_arg = path.to_string_lossy().into_owned();
        write_drawing(&drawing, &args(&["-e", "png", "--sheet", "-o", &path_arg]), &config)
            .unwrap();
        assert_eq!(file_names(&dir), vec!["sheet.png"]);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn report_counts_unused_marks() {
        let drawing = drawing(1);
        let mut registry = MarkRegistry::new();
        registry.extend("HEAx2000", ["A1", "A2"]);
        registry.extend("IPEx1000", ["B1"]);
        assert_eq!(report_marks(&drawing, &registry), 3);
        assert_eq!(report_marks(&drawing, &MarkRegistry::new()), 0);
    }

    #[test]
    fn page_outputs_beside_file() {
        let outputs = resolve_page_outputs(
            Some(Path::new("out/plan.svg")),
            OutputFormat::Svg,
            &pages(),
        )
        .unwrap();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("out/plan-1.1.svg"),
                PathBuf::from("out/plan-1.2.svg")
            ]
        );
    }

    #[test]
    fn page_outputs_into_directory() {
        let dir = std::env::temp_dir();
        let outputs = resolve_page_outputs(Some(dir.as_path()), OutputFormat::Png, &pages()).unwrap();
        assert_eq!(outputs[0], dir.join("1.1.png"));
        assert!(resolve_page_outputs(None, OutputFormat::Svg, &pages()).is_err());
    }

    #[test]
    fn parses_arguments() {
        let args = Args::try_parse_from([
            "cutplan",
            "-t",
            "tasks.json",
            "-m",
            "marks.json",
            "-e",
            "dxf",
            "--order",
            "4,6,3",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Dxf);
        assert_eq!(args.verbose, 2);
        assert_eq!(
            args.order.parse::<TaskOrder>().unwrap(),
            TaskOrder::Explicit(vec!["4".into(), "6".into(), "3".into()])
        );
    }
}
