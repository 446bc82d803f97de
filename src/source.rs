//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los tokens y los errores del front end llevan cuenta de una posición
//! línea-columna en el archivo original, lo cual permite señalar con
//! precisión el punto donde ocurre un error léxico o sintáctico.

use std::{fmt, rc::Rc};

/// Una posición línea-columna, ambas en base 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Position {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}:{}", self.line, self.column)
    }
}

/// El archivo de origen de una ubicación: su nombre y sus líneas crudas,
/// conservadas únicamente para poder mostrar contexto en diagnósticos.
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    lines: Vec<String>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        SourceFile {
            name: name.into(),
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Obtiene el texto de una línea, en base 1.
    pub fn line(&self, number: u32) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.lines.get(index as usize))
            .map(String::as_str)
    }
}

/// Una ubicación está conformada por un origen compartido y una posición.
#[derive(Debug, Clone)]
pub struct Location {
    source: Rc<SourceFile>,
    position: Position,
}

impl Location {
    pub fn new(source: Rc<SourceFile>, position: Position) -> Self {
        Location { source, position }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl fmt::Display for Location {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}:{}", self.source.name, self.position)
    }
}

/// Un valor cualquiera con una ubicación original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            value: f(self.value),
            location: self.location,
        }
    }
}
