use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tiler::{
    output_file_name, AssemblyExport, Machine, MachineCatalog, MachineLoader, Options, Run,
    Tiler, TilerError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The machine description file to compile
    #[clap(short, long, conflicts_with = "builtin")]
    machine: Option<PathBuf>,

    /// Use a built-in machine instead of a file
    #[clap(short, long)]
    builtin: Option<String>,

    /// JSON file with run options; flags override its values
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of assembly rows, 0 for unbounded
    #[clap(long)]
    max_depth: Option<usize>,

    /// Counter-clockwise quarter turns applied to the finished assembly
    #[clap(short, long, value_parser = clap::value_parser!(u8).range(0..=3))]
    rotation: Option<u8>,

    /// Mirror the finished assembly left to right
    #[clap(long)]
    flip_horizontal: bool,

    /// Mirror the finished assembly top to bottom
    #[clap(long)]
    flip_vertical: bool,

    /// Symbol wrapped around both ends of every input
    #[clap(long)]
    boundary_symbol: Option<String>,

    /// Keep traces that hit the maximum depth
    #[clap(long)]
    ignore_depth_failure: bool,

    /// Directory the assembly files are written to
    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the tape and head of every row
    #[clap(short = 'd', long)]
    debug: bool,

    /// List the built-in machines and exit
    #[clap(short, long)]
    list: bool,

    /// The input strings, one assembly each
    inputs: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list {
        for name in MachineCatalog::list_machine_names() {
            println!("{name}");
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), TilerError> {
    let options = options(cli)?;
    let machine = load_machine(cli, &options.boundary_symbol)?;
    let tiler = Tiler::new(machine, options)?;

    fs::create_dir_all(&cli.output_dir).map_err(|e| {
        TilerError::FileError(format!(
            "Failed to create {}: {}",
            cli.output_dir.display(),
            e
        ))
    })?;

    for result in tiler.assemble_all(cli.inputs.as_slice()) {
        // rejected inputs are logged by the tiler
        let Ok(run) = result else {
            continue;
        };

        if cli.debug {
            print_rows(&run);
        }

        if !tiler.keep(&run) {
            tracing::warn!(input = %run.input, "skipping incomplete trace");
            continue;
        }

        if let Err(e) = write_export(&tiler.machine().name, &run, &cli.output_dir) {
            tracing::warn!(input = %run.input, "skipping input: {e}");
            continue;
        }
    }

    Ok(())
}

fn options(cli: &Cli) -> Result<Options, TilerError> {
    let mut options = match &cli.config {
        Some(path) => Options::from_file(path)?,
        None => Options::default(),
    };

    if let Some(max_depth) = cli.max_depth {
        options.max_depth = max_depth;
    }
    if let Some(rotation) = cli.rotation {
        options.rotation = rotation;
    }
    if let Some(boundary_symbol) = &cli.boundary_symbol {
        options.boundary_symbol = boundary_symbol.clone();
    }
    options.flip_horizontal |= cli.flip_horizontal;
    options.flip_vertical |= cli.flip_vertical;
    options.ignore_depth_failure |= cli.ignore_depth_failure;

    options.validate()?;
    Ok(options)
}

fn load_machine(cli: &Cli, boundary_symbol: &str) -> Result<Machine, TilerError> {
    match (&cli.machine, &cli.builtin) {
        (Some(path), _) => MachineLoader::load_machine(path, boundary_symbol),
        (None, Some(name)) => {
            let text = MachineCatalog::get_machine_text_by_name(name)?;
            MachineLoader::load_machine_from_string(text, boundary_symbol)
        }
        (None, None) => Err(TilerError::OptionError(
            "either --machine or --builtin is required".to_string(),
        )),
    }
}

fn print_rows(run: &Run) {
    let assembly = run.assembly();
    println!("Input: {} ({:?})", run.input, run.termination());

    for row in 0..assembly.height() {
        let tape = assembly.tape(row).unwrap_or_else(|| "-".to_string());
        match assembly.head(row) {
            Some((column, state)) => {
                println!("Row: {row}, Tape: {tape}, Head: {column}, State: {state}")
            }
            None => println!("Row: {row}, Tape: {tape}"),
        }
    }

    if let Some(output) = assembly.output() {
        println!("Output: {output}");
    }
}

fn write_export(machine: &str, run: &Run, directory: &Path) -> Result<(), TilerError> {
    let json = AssemblyExport::new(machine, run).to_json()?;
    let path = directory.join(output_file_name(machine, &run.input));

    fs::write(&path, json).map_err(|e| {
        TilerError::FileError(format!("Failed to write {}: {}", path.display(), e))
    })?;

    tracing::info!(path = %path.display(), "Wrote assembly");
    Ok(())
}
