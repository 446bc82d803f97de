//! Análisis léxico.
//!
//! Este módulo cubre las dos primeras fases del front end: limpiar el texto
//! fuente de comentarios (conservando literales de cadena tal cual) y
//! producir, a partir del texto limpio, la secuencia ordenada de tokens
//! clasificados que consume el parser.
//!
//! # Limitación conocida
//! La limpieza de comentarios no trata los literales de cadena como opacos:
//! un literal que contenga `//` o `/*` será limpiado incorrectamente. Este
//! comportamiento se conserva deliberadamente (ver DESIGN.md) en vez de
//! corregirse.

use crate::source::{Located, Location, Position, SourceFile};
use std::{fmt, rc::Rc, str::FromStr};

/// Las 21 palabras clave del lenguaje. Case-sensitive.
pub const KEYWORDS: &[(&str, Keyword)] = &[
    ("class", Keyword::Class),
    ("constructor", Keyword::Constructor),
    ("function", Keyword::Function),
    ("method", Keyword::Method),
    ("field", Keyword::Field),
    ("static", Keyword::Static),
    ("var", Keyword::Var),
    ("int", Keyword::Int),
    ("char", Keyword::Char),
    ("boolean", Keyword::Boolean),
    ("void", Keyword::Void),
    ("true", Keyword::True),
    ("false", Keyword::False),
    ("null", Keyword::Null),
    ("this", Keyword::This),
    ("let", Keyword::Let),
    ("do", Keyword::Do),
    ("if", Keyword::If),
    ("else", Keyword::Else),
    ("while", Keyword::While),
    ("return", Keyword::Return),
];

/// Los 19 símbolos del lenguaje, cada uno un solo carácter.
pub const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

pub fn is_symbol_char(c: char) -> bool {
    SYMBOLS.contains(&c)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| keyword == self)
            .map(|(text, _)| *text)
            .expect("every Keyword variant has an entry in KEYWORDS")
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        KEYWORDS
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, keyword)| *keyword)
            .ok_or(())
    }
}

/// La clasificación de un token, sin carga asociada: el lexema crudo vive
/// por separado en [`Token::text`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Symbol,
    IntegerConstant,
    StringConstant,
    Identifier,
}

impl TokenKind {
    /// El nombre de etiqueta XML usado para hojas de este tipo.
    pub fn xml_tag(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::IntegerConstant => "integerConstant",
            TokenKind::StringConstant => "stringConstant",
            TokenKind::Identifier => "identifier",
        }
    }
}

/// Un lexema clasificado. Dos atributos observables: `kind` y `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.chars().next() == Some(c)
    }

    pub fn symbol_char(&self) -> Option<char> {
        if self.kind == TokenKind::Symbol {
            self.text.chars().next()
        } else {
            None
        }
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        if self.kind == TokenKind::Keyword {
            Keyword::from_str(&self.text).ok()
        } else {
            None
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_keyword() == Some(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Keyword => write!(fmt, "keyword `{}`", self.text),
            TokenKind::Symbol => write!(fmt, "`{}`", self.text),
            TokenKind::IntegerConstant => write!(fmt, "integer constant `{}`", self.text),
            TokenKind::StringConstant => write!(fmt, "string constant \"{}\"", self.text),
            TokenKind::Identifier => write!(fmt, "identifier `{}`", self.text),
        }
    }
}

pub use crate::error::LexError;

/// Elimina comentarios del texto fuente, preservando todo lo demás
/// (incluyendo el contenido de literales de cadena) tal cual.
///
/// Los comentarios de bloque se eliminan primero (sin anidar, buscando el
/// primer `*/` que cierre cada `/*`), luego los comentarios de línea. Este
/// orden asegura que `/* // sigue siendo un bloque */` se elimine como una
/// sola unidad.
pub fn clean(text: &str) -> String {
    strip_line_comments(&strip_block_comments(text))
}

fn strip_block_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    loop {
        match rest.find("/*") {
            None => {
                out.push_str(rest);
                break;
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                let after_open = &rest[start + 2..];

                match after_open.find("*/") {
                    // Comentario de bloque sin cerrar: se deja tal cual,
                    // igual que una expresión regular que no encuentra
                    // coincidencia deja su entrada intacta.
                    None => {
                        out.push_str(&rest[start..]);
                        break;
                    }
                    Some(end) => rest = &after_open[end + 2..],
                }
            }
        }
    }

    out
}

fn strip_line_comments(input: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in input.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        lines.push(match line.find("//") {
            Some(index) => &line[..index],
            None => line,
        });
    }

    lines.join("\n")
}

/// Divide el texto ya limpio en líneas no vacías, recortadas de ambos
/// extremos, conservando el número de línea original para diagnósticos.
fn valid_lines(cleaned: &str) -> impl Iterator<Item = (u32, &str)> {
    cleaned
        .split('\n')
        .enumerate()
        .map(|(index, line)| (index as u32 + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Tokeniza un archivo fuente completo.
pub fn lex(text: &str, source: Rc<SourceFile>) -> Result<Vec<Located<Token>>, Located<LexError>> {
    let cleaned = clean(text);
    let mut tokens = Vec::new();

    for (line_number, line) in valid_lines(&cleaned) {
        lex_line(line, line_number, &source, &mut tokens)?;
    }

    Ok(tokens)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    InWord,
    InString,
}

fn lex_line(
    line: &str,
    line_number: u32,
    source: &Rc<SourceFile>,
    out: &mut Vec<Located<Token>>,
) -> Result<(), Located<LexError>> {
    let chars: Vec<char> = line.chars().collect();
    let mut state = State::None;
    let mut start = 0usize;

    let at = |column: usize| {
        Location::new(Rc::clone(source), Position::new(line_number, column as u32 + 1))
    };

    for i in 0..chars.len() {
        let c = chars[i];

        match state {
            State::None => {
                if c.is_whitespace() {
                    // skip
                } else if c == '"' {
                    state = State::InString;
                    start = i;
                } else if is_symbol_char(c) {
                    emit_symbol(out, c, &at(i));
                } else {
                    state = State::InWord;
                    start = i;
                }
            }

            State::InWord => {
                if c.is_whitespace() {
                    emit_word(out, &chars[start..i], &at(start));
                    state = State::None;
                } else if is_symbol_char(c) {
                    emit_word(out, &chars[start..i], &at(start));
                    emit_symbol(out, c, &at(i));
                    state = State::None;
                } else if c == '"' {
                    emit_word(out, &chars[start..i], &at(start));
                    state = State::InString;
                    start = i;
                }
                // other: word continues
            }

            State::InString => {
                if c == '"' {
                    let text: String = chars[start + 1..i].iter().collect();
                    out.push(Located::at(
                        Token::new(TokenKind::StringConstant, text),
                        at(start),
                    ));
                    state = State::None;
                }
                // any other character, including whitespace, continues the string
            }
        }
    }

    match state {
        State::None => {}
        State::InWord => emit_word(out, &chars[start..], &at(start)),
        State::InString => {
            return Err(Located::at(LexError::UnterminatedString, at(start)));
        }
    }

    Ok(())
}

fn emit_symbol(out: &mut Vec<Located<Token>>, c: char, location: &Location) {
    out.push(Located::at(
        Token::new(TokenKind::Symbol, c.to_string()),
        location.clone(),
    ));
}

fn emit_word(out: &mut Vec<Located<Token>>, word: &[char], location: &Location) {
    let word: String = word.iter().collect();

    let kind = if Keyword::from_str(&word).is_ok() {
        TokenKind::Keyword
    } else if word.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        TokenKind::IntegerConstant
    } else {
        TokenKind::Identifier
    };

    out.push(Located::at(Token::new(kind, word), location.clone()));
}
