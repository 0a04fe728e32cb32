use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use nex_lexgen::{generate_from_source, CompileOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// nex - generate a longest-match scanner module from a rule file
///
/// The scanner module is written to `<input without extension>.nn.rs`
/// (`_nn.rs` when reading stdin). User code following the rules is written
/// to stdout with `NN_FUN` replaced by the action dispatcher.
#[derive(Parser, Debug)]
#[command(name = "nex")]
#[command(version)]
#[command(about = "Lexer generator: rule file in, Rust scanner module out", long_about = None)]
struct Args {
    /// Rule file to read (stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Where to write the scanner module
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Compile rules on the current thread only
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("nex=info".parse().expect("valid log directive"))
                .add_directive("nex_lexgen=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = match &args.input {
        Some(path) => {
            if path.extension().is_some_and(|ext| ext == "rs") {
                bail!("input filename ends with .rs: {}", path.display());
            }
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        },
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read rule file from stdin")?;
            source
        },
    };

    let mut options = CompileOptions::from_env();
    if args.sequential {
        options.parallel = false;
    }

    let module = generate_from_source(&source, &options).with_context(|| match &args.input {
        Some(path) => format!("failed to generate scanner from {}", path.display()),
        None => "failed to generate scanner from stdin".to_string(),
    })?;

    let output = output_path(args.input.as_deref(), args.output);
    let mut text = format!("// Generated by nex for package `{}`. Do not edit.\n", module.package);
    text.push_str(&module.scanner);
    text.push('\n');
    std::fs::write(&output, text)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), "wrote scanner module");

    if let Some(user_code) = module.user_code {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(user_code.as_bytes()).context("failed to write user code")?;
        stdout.flush().context("failed to write user code")?;
    }

    Ok(())
}

/// `-o` if given, else the input path with its extension replaced by
/// `.nn.rs`, else `_nn.rs`.
fn output_path(input: Option<&Path>, output: Option<PathBuf>) -> PathBuf {
    if let Some(output) = output {
        return output;
    }
    match input {
        Some(path) => {
            let mut name = path.file_stem().unwrap_or(path.as_os_str()).to_os_string();
            name.push(".nn.rs");
            path.with_file_name(name)
        },
        None => PathBuf::from("_nn.rs"),
    }
}
