use pedigree_layout::{LayoutOptions, PedigreeEntry};
use pedigree_render::SvgRenderOptions;
use serde::Serialize;
use std::io::Read;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Layout(pedigree_layout::Error),
    Render(pedigree_render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<pedigree_layout::Error> for CliError {
    fn from(value: pedigree_layout::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<pedigree_render::Error> for CliError {
    fn from(value: pedigree_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Forests,
    #[default]
    Layout,
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Json,
    Ped,
}

impl FromStr for InputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ped" => Ok(Self::Ped),
            _ => Err(()),
        }
    }
}

impl InputFormat {
    fn for_input(input: Option<&str>) -> Self {
        match input {
            Some(path) if path.to_ascii_lowercase().ends_with(".ped") => Self::Ped,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    input_format: Option<InputFormat>,
    family: Option<String>,
    pretty: bool,
    options: Option<String>,
    max_iterations: Option<usize>,
    diagram_id: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "pedigree-cli\n\
\n\
USAGE:\n\
  pedigree-cli forests [--input-format json|ped] [--family <id>] [--pretty] [<path>|-]\n\
  pedigree-cli [layout] [--input-format json|ped] [--family <id>] [--options <json>] [--max-iterations <n>] [--pretty] [<path>|-]\n\
  pedigree-cli render [--input-format json|ped] [--family <id>] [--options <json>] [--max-iterations <n>] [--id <svg-id>] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is PED for *.ped paths and JSON otherwise, unless --input-format is given.\n\
  - --options reads a JSON object of layout options; missing keys keep their defaults.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - A layout that does not converge renders a fallback SVG.\n\
  - Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "forests" => args.command = Command::Forests,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--input-format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.input_format = Some(
                    fmt.parse::<InputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--family" => {
                let Some(family) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.family = Some(family.clone());
            }
            "--options" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.options = Some(path.clone());
            }
            "--max-iterations" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.max_iterations =
                    Some(n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn read_entries(args: &Args) -> Result<Vec<PedigreeEntry>, CliError> {
    let text = read_input(args.input.as_deref())?;
    let format = args
        .input_format
        .unwrap_or_else(|| InputFormat::for_input(args.input.as_deref()));
    let entries = match format {
        InputFormat::Json => pedigree_layout::parse_json(&text)?,
        InputFormat::Ped => pedigree_layout::parse_ped(&text)?,
    };
    let entries = match args.family.as_deref() {
        Some(family) => pedigree_layout::select_family(entries, family),
        None => entries,
    };
    debug!(entries = entries.len(), ?format, "pedigree input read");
    Ok(entries)
}

fn layout_options(args: &Args) -> Result<LayoutOptions, CliError> {
    let mut options = match args.options.as_deref() {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => LayoutOptions::default(),
    };
    if let Some(n) = args.max_iterations {
        options.max_iterations = n;
    }
    Ok(options)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let entries = read_entries(&args)?;

    match args.command {
        Command::Forests => {
            let partition = pedigree_layout::build_forests(&entries)?;
            write_json(&partition, args.pretty)
        }
        Command::Layout => {
            let options = layout_options(&args)?;
            let layout = pedigree_layout::layout_pedigree(&entries, &options)?;
            write_json(&layout, args.pretty)
        }
        Command::Render => {
            let options = layout_options(&args)?;
            let svg_options = SvgRenderOptions {
                diagram_id: args.diagram_id.clone(),
                ..Default::default()
            };
            let svg = pedigree_render::render_layout_result(
                pedigree_layout::layout_pedigree(&entries, &options),
                &entries,
                &svg_options,
            )?;
            write_text(&svg, args.out.as_deref())
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
