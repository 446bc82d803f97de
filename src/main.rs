//! Punto de entrada ("driver").
//!
//! Resuelve los argumentos de línea de comandos, inicializa el logging,
//! y delega el trabajo real a [`jack_analyzer::driver`].

use anyhow::Context;
use clap::Parser;
use jack_analyzer::driver;
use log::Level;
use std::path::PathBuf;

/// Tokenizer and syntax analyzer front end for the Jack language.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Archivo `.jack` o directorio a procesar.
    input_path: PathBuf,

    /// Emitir únicamente el flujo de tokens en vez del árbol de sintaxis
    /// completo.
    #[arg(short = 't', long = "token-test")]
    token_test: bool,

    /// Aumenta el nivel de detalle del logging; puede repetirse
    /// (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::Warn,
        1 => Level::Info,
        _ => Level::Debug,
    };

    simple_logger::init_with_level(level).context("failed to initialize logger")?;

    driver::run(&cli.input_path, cli.token_test)
}
