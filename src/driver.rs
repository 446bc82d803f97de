//! Orquestación del proceso de un archivo a la vez y de directorios.
//!
//! Cada archivo `.jack` produce un `.xml` del mismo nombre junto a él,
//! conteniendo el árbol de sintaxis completo de la clase. Si cualquier
//! fase falla, el archivo de salida no debe quedar a medio escribir: se
//! construye en un archivo temporal que sólo se promueve a su nombre
//! final tras un éxito completo.

use crate::error::{Diagnostics, EmitError};
use crate::lex;
use crate::parse::parse_class;
use crate::source::{Located, Location, Position, SourceFile};
use crate::xml::Emitter;
use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Procesa una ruta: un único archivo `.jack`, o un directorio, en cuyo
/// caso se procesa cada `.jack` que contiene directamente (sin recursión).
pub fn run(path: &Path, tokens_only: bool) -> Result<()> {
    if path.is_dir() {
        run_directory(path, tokens_only)
    } else {
        process_file(path, tokens_only)
    }
}

fn run_directory(dir: &Path, tokens_only: bool) -> Result<()> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("jack"))
        .collect();

    files.sort();

    if files.is_empty() {
        anyhow::bail!("no .jack files found in {}", dir.display());
    }

    let mut failures = 0;

    for file in &files {
        if let Err(err) = process_file(file, tokens_only) {
            log::error!("{}: {:#}", file.display(), err);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, files.len());
    }

    Ok(())
}

/// Lexea y parsea un único archivo, escribiendo su salida XML junto a él.
///
/// Nombre de salida: la extensión de entrada se reemplaza por `.xml`,
/// tanto en modo `--token-test` como en modo normal.
fn process_file(path: &Path, tokens_only: bool) -> Result<()> {
    log::info!("processing {}", path.display());

    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let source = Rc::new(SourceFile::new(name, &text));

    let output_path = path.with_extension("xml");
    let mut guard = OutputGuard::create(&output_path)?;

    let result = if tokens_only {
        emit_tokens(&text, Rc::clone(&source), guard.writer())
    } else {
        emit_tree(&text, Rc::clone(&source), guard.writer())
    };

    match result {
        Ok(token_count) => {
            guard.commit()?;
            log::debug!(
                "{}: {} tokens, output {}",
                path.display(),
                token_count,
                output_path.display()
            );
            log::info!("wrote {}", output_path.display());
            Ok(())
        }
        Err(diagnostics) => {
            // `guard` is dropped at the end of this arm without being
            // committed, which deletes the partial output.
            eprint!("{}", diagnostics);
            anyhow::bail!("{}: compilation failed", path.display());
        }
    }
}

/// Emite únicamente el flujo de tokens como `<tokens>...</tokens>`, sin
/// pasar por el parser. Devuelve la cantidad de tokens emitidos.
fn emit_tokens(text: &str, source: Rc<SourceFile>, sink: impl Write) -> Result<usize, Diagnostics> {
    let tokens = lex::lex(text, Rc::clone(&source)).map_err(Diagnostics::from)?;
    let mut emitter = Emitter::new(sink);

    let io_error_at = |location: &Location, err: std::io::Error| {
        Diagnostics::from(Located::at(EmitError::from(err), location.clone()))
    };

    let start = tokens
        .first()
        .map(Located::location)
        .cloned()
        .unwrap_or_else(|| eof_location(&source));

    emitter
        .open("tokens")
        .map_err(|err| io_error_at(&start, err))?;

    for token in &tokens {
        emitter
            .token(token.value())
            .map_err(|err| Diagnostics::from(Located::at(err, token.location().clone())))?;
    }

    emitter
        .close("tokens")
        .map_err(|err| io_error_at(&start, err))?;

    Ok(tokens.len())
}

/// Lexea y parsea el archivo completo, emitiendo el árbol de sintaxis.
/// Devuelve la cantidad de tokens consumidos.
fn emit_tree(text: &str, source: Rc<SourceFile>, sink: impl Write) -> Result<usize, Diagnostics> {
    let tokens = lex::lex(text, Rc::clone(&source)).map_err(Diagnostics::from)?;
    let eof_location = eof_location(&source);
    let token_count = tokens.len();

    let mut emitter = Emitter::new(sink);
    parse_class(&tokens, eof_location, &mut emitter).map_err(Diagnostics::from)?;

    Ok(token_count)
}

/// Una ubicación razonable para señalar errores que ocurren "después" del
/// último token, usada tanto para el fin de archivo del parser como para
/// diagnósticos de E/S sin un token concreto al que anclarse.
fn eof_location(source: &Rc<SourceFile>) -> Location {
    let mut last_line = 1u32;
    let mut line_number = 1u32;

    while source.line(line_number).is_some() {
        last_line = line_number;
        line_number += 1;
    }

    let column = source
        .line(last_line)
        .map(|line| line.chars().count() as u32 + 1)
        .unwrap_or(1);

    Location::new(Rc::clone(source), Position::new(last_line, column))
}

/// Archivo de salida que se descarta si nunca se llama a [`OutputGuard::commit`].
///
/// Se escribe a un archivo temporal junto al destino final; `commit`
/// renombra el temporal al nombre definitivo. Si el guard se destruye sin
/// haberse confirmado (por ejemplo porque `?` propagó un error), el
/// temporal se borra en `Drop`.
struct OutputGuard {
    final_path: PathBuf,
    temp_path: PathBuf,
    file: Option<fs::File>,
    committed: bool,
}

impl OutputGuard {
    fn create(final_path: &Path) -> Result<Self> {
        let temp_path = final_path.with_extension("xml.tmp");
        let file = fs::File::create(&temp_path)
            .with_context(|| format!("failed to create {}", temp_path.display()))?;

        Ok(OutputGuard {
            final_path: final_path.to_owned(),
            temp_path,
            file: Some(file),
            committed: false,
        })
    }

    fn writer(&mut self) -> &mut fs::File {
        self.file.as_mut().expect("file is only taken on drop")
    }

    fn commit(&mut self) -> Result<()> {
        self.writer()
            .flush()
            .with_context(|| format!("failed to flush {}", self.temp_path.display()))?;

        fs::rename(&self.temp_path, &self.final_path).with_context(|| {
            format!(
                "failed to move {} into place as {}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;

        self.committed = true;
        Ok(())
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        self.file = None;

        if !self.committed {
            if let Err(err) = fs::remove_file(&self.temp_path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::error!(
                        "failed to remove partial output {}: {}",
                        self.temp_path.display(),
                        err
                    );
                }
            }
        }
    }
}
