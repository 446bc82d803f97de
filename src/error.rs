//! Tipos de error de cada subsistema y su presentación al usuario.

use crate::source::{Located, Location};
use std::{
    error::Error,
    fmt::{self, Display},
    io,
};
use thiserror::Error as ThisError;

mod sealed {
    pub trait Sealed {}
}

/// Cualquier error que conoce su propia ubicación en el archivo original.
pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;
}

impl<E: Error> sealed::Sealed for Located<E> {}

impl<E: Error> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.value()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }
}

/// Una colección de errores localizados, lista para mostrarse al usuario.
#[derive(Default)]
pub struct Diagnostics(Vec<Box<dyn 'static + LocatedError>>);

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics(vec![Box::new(error)])
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics(errors) = self;

        for error in errors {
            writeln!(fmt, "error: {}", error.source())?;

            let location = error.location();
            writeln!(fmt, " --> {}", location)?;

            if let Some(line) = location.source().line(location.position().line()) {
                let digits = location.position().line().to_string().chars().count();
                writeln!(fmt, "{:digits$} |", "", digits = digits)?;
                writeln!(
                    fmt,
                    "{:>digits$} | {}",
                    location.position().line(),
                    line,
                    digits = digits
                )?;

                let skip = (location.position().column().max(1) - 1) as usize;
                writeln!(
                    fmt,
                    "{:digits$} | {:skip$}^",
                    "",
                    "",
                    digits = digits,
                    skip = skip
                )?;
            }
        }

        Ok(())
    }
}

/// Falla al intentar clasificar tokens a partir del texto fuente.
#[derive(ThisError, Debug)]
pub enum LexError {
    /// Una cadena de texto no se cerró antes del fin de línea.
    #[error("unterminated string literal")]
    UnterminatedString,
}

/// Falla al leer el cursor de tokens más allá del final de la secuencia.
#[derive(ThisError, Debug)]
pub enum CursorError {
    #[error("read past the end of the token stream")]
    PastEnd,
}

/// Falla al escribir un nodo hacia el emisor de XML.
#[derive(ThisError, Debug)]
pub enum EmitError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("integer constant `{0}` is out of range [0, 32767]")]
    IntegerOutOfRange(String),
}

/// Falla del analizador sintáctico.
#[derive(ThisError, Debug)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("expected {expected}, but reached the end of the file")]
    UnexpectedEof { expected: String },

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}
