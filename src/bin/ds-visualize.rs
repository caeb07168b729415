//! ds-visualize — render a DiffSinger project (.ds) as a piano-roll SVG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dsvis::{
    expand_track, normalize_color, parse_file, render_units_to_svg, write_units_json, ProjectError,
    RejectPolicy, RenderOptions,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "ds-visualize")]
#[command(about = "DiffSinger project file (.ds) visualizer", version)]
struct Cli {
    /// Input .ds project file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (.svg); defaults to the input name with an .svg extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with base render options; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color of "head" units (e.g. 8c2128)
    #[arg(long)]
    color_head: Option<String>,

    /// Color of "body" units (e.g. d34343)
    #[arg(long)]
    color_body: Option<String>,

    /// Color of the pitch curve
    #[arg(long)]
    color_f0: Option<String>,

    /// Color of lyric and phoneme text
    #[arg(long)]
    color_text: Option<String>,

    /// Figure width in inches
    #[arg(long)]
    width: Option<u32>,

    /// Figure height in inches. Accepted for compatibility; the height
    /// follows from the pitch range and --aspect
    #[arg(long)]
    height: Option<u32>,

    /// Dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    /// Height of one semitone relative to one second
    #[arg(long)]
    aspect: Option<f64>,

    /// Font family for labels
    #[arg(long)]
    font_family: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f64>,

    /// Font style (normal, italic, oblique)
    #[arg(long)]
    font_style: Option<String>,

    /// Do not draw the pitch curve
    #[arg(long)]
    no_f0: bool,

    /// Abort on the first segment that fails validation instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Also write the expanded unit timeline as JSON
    #[arg(long)]
    units_json: Option<PathBuf>,
}

impl Cli {
    fn render_options(&self) -> Result<RenderOptions, ProjectError> {
        let mut options = match &self.config {
            Some(path) => RenderOptions::load(path)?,
            None => RenderOptions::default(),
        };
        if let Some(c) = &self.color_head {
            options.color_head = normalize_color(c);
        }
        if let Some(c) = &self.color_body {
            options.color_body = normalize_color(c);
        }
        if let Some(c) = &self.color_f0 {
            options.color_f0 = normalize_color(c);
        }
        if let Some(c) = &self.color_text {
            options.color_text = normalize_color(c);
        }
        if let Some(w) = self.width {
            options.width = w;
        }
        if let Some(h) = self.height {
            warn!(height = h, "--height is ignored, the figure height follows --aspect");
        }
        if let Some(d) = self.dpi {
            options.dpi = d;
        }
        if let Some(a) = self.aspect {
            options.aspect = a;
        }
        if let Some(f) = &self.font_family {
            options.font_family = f.clone();
        }
        if let Some(s) = self.font_size {
            options.font_size = s;
        }
        if let Some(s) = &self.font_style {
            options.font_style = s.clone();
        }
        if self.no_f0 {
            options.display_f0 = false;
        }
        Ok(options)
    }
}

/// `song.ds` → `song.svg`; any other name gets `.svg` appended. The output
/// lands in the current directory.
fn default_output(input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let is_ds = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ds"));
    if is_ds {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        PathBuf::from(format!("{stem}.svg"))
    } else {
        PathBuf::from(format!("{file_name}.svg"))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let Some(input) = cli.input.clone() else {
        error!("please specify an input file with --input");
        return ExitCode::from(1);
    };
    let output = cli.output.clone().unwrap_or_else(|| default_output(&input));

    let options = match cli.render_options() {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };
    let policy = if cli.strict {
        RejectPolicy::Abort
    } else {
        RejectPolicy::Skip
    };

    info!(input = %input.display(), output = %output.display(), "reading project");
    let track = match parse_file(&input, policy) {
        Ok(track) => track,
        Err(e @ ProjectError::Io { .. }) => {
            error!("{e}");
            return ExitCode::from(2);
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };

    info!(
        segments = track.segments.len(),
        notes = track.note_count(),
        "expanding notes and phonemes"
    );
    let units = expand_track(&track);

    if let Some(path) = &cli.units_json {
        if let Err(e) = write_units_json(path, &units) {
            error!("{e}");
            return ExitCode::from(1);
        }
        info!(path = %path.display(), "wrote unit timeline");
    }

    let svg = render_units_to_svg(&units, &track.segments, &options);
    if let Err(e) = std::fs::write(&output, svg) {
        error!("failed to write {}: {e}", output.display());
        return ExitCode::from(1);
    }
    info!(output = %output.display(), units = units.len(), "saved visualization");
    ExitCode::SUCCESS
}
