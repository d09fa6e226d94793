//! kcc command-line driver

use anyhow::{Context, Result};
use clap::Parser as CliParser;
use kcc::{AssemblyConfig, CompileOptions, Compiler, Diagnostic, Scanner, SyntaxMode};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Compile a small C subset to x86-64 assembly
#[derive(CliParser, Debug)]
#[command(name = "kcc", version, about)]
struct Cli {
    /// Source file to compile
    input: PathBuf,

    /// Write assembly to FILE instead of stdout
    #[arg(short = 'S', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit AT&T syntax instead of Intel
    #[arg(long)]
    att: bool,

    /// Omit the `.intel_syntax noprefix` directive
    #[arg(long)]
    no_directive: bool,

    /// Symbol prefix for the entry point
    #[arg(long, value_name = "PREFIX", default_value = "_")]
    entry_prefix: String,

    /// Print the token stream as JSON instead of compiling
    #[arg(long, conflicts_with = "dump_ast")]
    dump_tokens: bool,

    /// Print the AST as JSON instead of compiling
    #[arg(long)]
    dump_ast: bool,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            assembly: AssemblyConfig {
                syntax: if self.att {
                    SyntaxMode::Att
                } else {
                    SyntaxMode::Intel
                },
                syntax_directive: !self.no_directive,
                entry_prefix: self.entry_prefix.clone(),
                ..AssemblyConfig::default()
            },
        }
    }

    fn module_name(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| kcc::DEFAULT_MODULE.to_string())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(&Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the source compiled cleanly
fn run(cli: &Cli) -> Result<bool> {
    let source = fs::read(&cli.input)
        .with_context(|| format!("could not read {}", cli.input.display()))?;
    let module = cli.module_name();
    let compiler = Compiler::new(cli.options());

    if cli.dump_tokens {
        let mut scanner = Scanner::new(&module, &source);
        let tokens = scanner.scan_tokens();
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        print_diagnostics(scanner.warnings());
        print_diagnostics(scanner.diagnostics());
        return Ok(scanner.diagnostics().is_empty());
    }

    if cli.dump_ast {
        let (program, state) = compiler.parse(&module, &source)?;
        println!("{}", serde_json::to_string_pretty(&program)?);
        print_diagnostics(&state.warnings);
        print_diagnostics(&state.diagnostics);
        return Ok(!state.has_errors());
    }

    let output = match &cli.output {
        None => compiler.compile_to(&module, &source, &mut io::stdout().lock())?,
        Some(path) => {
            let output = compiler.compile(&module, &source)?;
            if let Some(assembly) = &output.assembly {
                fs::write(path, assembly)
                    .with_context(|| format!("could not write {}", path.display()))?;
            }
            output
        }
    };

    print_diagnostics(&output.warnings);
    print_diagnostics(&output.diagnostics);
    Ok(output.is_success())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}", diag);
    }
}
