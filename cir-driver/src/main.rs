//! C IR core driver
//!
//! Writes sample program envelopes, dumps existing ones and shows the bytes
//! of a type envelope. Encoding options come from an optional JSON file.

mod sample;
mod spelling;

use cir_ir::{Program, StageContext, Version};
use cir_wire::EncodeOptions;
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use sample::{build_sample, FoldLiterals, FoldLog};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "circ")]
#[command(about = "C IR envelope tool")]
#[command(version = "0.1.0")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file with encoding options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the envelope of a small sample program
    Sample {
        /// Output envelope file
        #[arg(short, long)]
        output: PathBuf,

        /// Skip the literal folding stage
        #[arg(long)]
        unfolded: bool,

        /// Lock the program before writing it
        #[arg(long)]
        lock: bool,
    },

    /// Decode a program envelope and print it
    Inspect {
        /// Envelope file
        input: PathBuf,

        /// Print each node as it was before its first edit
        #[arg(long)]
        canonical: bool,

        /// Dump the decoded program as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the envelope bytes of a builtin type, e.g. `static unsigned long`
    TypeHex {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_options(cli.config.as_deref()).and_then(|options| match cli.command {
        Commands::Sample { output, unfolded, lock } => write_sample(&output, &options, unfolded, lock),
        Commands::Inspect { input, canonical, json } => inspect(&input, canonical, json),
        Commands::TypeHex { keywords } => type_hex(&keywords),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_options(path: Option<&Path>) -> Result<EncodeOptions, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let options = serde_json::from_str(&text)?;
            info!("loaded encoding options from {}", path.display());
            Ok(options)
        }
        None => Ok(EncodeOptions::default()),
    }
}

fn write_sample(output: &Path, options: &EncodeOptions, unfolded: bool, lock: bool) -> Result<(), Box<dyn Error>> {
    let mut program = build_sample()?;

    if !unfolded {
        let mut context = StageContext::new();
        program.run_stage(&mut FoldLiterals, &mut context)?;
        context.reporter().print_diagnostics();
        info!("fold-literals: {}", context.reporter().summary());
        if let Some(log) = program.result_section::<FoldLog>() {
            for line in &log.0 {
                println!("folded {line}");
            }
        }
    }
    if lock {
        program.lock();
    }

    let bytes = program.to_envelope(options);
    fs::write(output, &bytes)?;
    println!("Wrote {} byte(s) to {}", bytes.len(), output.display());
    Ok(())
}

fn inspect(input: &Path, canonical: bool, json: bool) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(input)?;
    let program = Program::from_envelope(&bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&program)?);
        return Ok(());
    }
    print!("{}", describe(&program, if canonical { Version::Canonical } else { Version::Live }));
    Ok(())
}

fn describe(program: &Program, version: Version) -> String {
    let mut out = format!(
        "program '{}'\nphase: {}\nlocked: {}\n",
        program.name(),
        program.condition().current(),
        if program.is_locked() { "yes" } else { "no" }
    );
    out.push_str(&format!("symbols: {}\n", program.symbols().len()));
    for (name, node) in program.symbols().iter() {
        let kind = program.ast().and_then(|ast| ast.get(node)).map(|n| n.kind().name());
        out.push_str(&format!("  {name} -> {node} ({})\n", kind.unwrap_or("?")));
    }
    match program.ast().and_then(|ast| ast.root().map(|root| ast.print(root, version))) {
        Some(tree) => out.push_str(&tree),
        None => out.push_str("(no ast)\n"),
    }
    out
}

fn type_hex(keywords: &[String]) -> Result<(), Box<dyn Error>> {
    let words = keywords.iter().flat_map(|k| k.split_whitespace());
    let ty = spelling::parse_type(words)?;
    println!("{ty}: {}", spelling::hex(&ty.serialize()));
    Ok(())
}
