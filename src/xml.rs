//! Emisor de XML indentado.
//!
//! Una envoltura delgada sobre cualquier [`Write`] que sabe abrir y cerrar
//! etiquetas con la indentación correcta y escribir hojas con el texto
//! escapado según las reglas de XML.

use crate::error::EmitError;
use crate::lex::{Token, TokenKind};
use std::io::{self, Write};

const INDENT_WIDTH: usize = 2;

pub struct Emitter<W: Write> {
    sink: W,
    depth: usize,
}

impl<W: Write> Emitter<W> {
    pub fn new(sink: W) -> Self {
        Emitter { sink, depth: 0 }
    }

    fn write_indent(&mut self) -> io::Result<()> {
        write!(self.sink, "{:width$}", "", width = self.depth * INDENT_WIDTH)
    }

    /// Abre una etiqueta y aumenta la indentación para lo que sigue.
    pub fn open(&mut self, tag: &str) -> io::Result<()> {
        self.write_indent()?;
        writeln!(self.sink, "<{}>", tag)?;
        self.depth += 1;
        Ok(())
    }

    /// Cierra una etiqueta, habiendo primero restaurado la indentación
    /// al nivel en que se abrió.
    pub fn close(&mut self, tag: &str) -> io::Result<()> {
        self.depth -= 1;
        self.write_indent()?;
        writeln!(self.sink, "</{}>", tag)
    }

    /// Escribe una hoja `<tag>texto</tag>` con el texto escapado.
    pub fn leaf(&mut self, tag: &str, text: &str) -> io::Result<()> {
        self.write_indent()?;
        writeln!(self.sink, "<{}>{}</{}>", tag, escape(text), tag)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Consume el emisor y devuelve el sumidero subyacente.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Escribe un token como su hoja correspondiente, normalizando
    /// constantes enteras a su valor decimal y validando su rango.
    pub fn token(&mut self, token: &Token) -> Result<(), EmitError> {
        match token.kind() {
            TokenKind::IntegerConstant => {
                let value: u64 = token
                    .text()
                    .parse()
                    .map_err(|_| EmitError::IntegerOutOfRange(token.text().to_owned()))?;

                if value > 32767 {
                    return Err(EmitError::IntegerOutOfRange(token.text().to_owned()));
                }

                self.leaf("integerConstant", &value.to_string())?;
            }
            kind => self.leaf(kind.xml_tag(), token.text())?,
        }

        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Token;

    fn render(f: impl FnOnce(&mut Emitter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut emitter = Emitter::new(Vec::new());
        f(&mut emitter).unwrap();
        String::from_utf8(emitter.sink).unwrap()
    }

    #[test]
    fn open_close_indent_matching_children() {
        let xml = render(|e| {
            e.open("class")?;
            e.leaf("keyword", "class")?;
            e.close("class")
        });

        assert_eq!(xml, "<class>\n  <keyword>class</keyword>\n</class>\n");
    }

    #[test]
    fn escapes_only_the_five_xml_characters() {
        assert_eq!(escape("<>&\"'"), "&lt;&gt;&amp;&quot;&apos;");
        assert_eq!(escape("plain text 123"), "plain text 123");
    }

    #[test]
    fn nested_tags_increase_indentation() {
        let xml = render(|e| {
            e.open("a")?;
            e.open("b")?;
            e.leaf("c", "x")?;
            e.close("b")?;
            e.close("a")
        });

        assert_eq!(
            xml,
            "<a>\n  <b>\n    <c>x</c>\n  </b>\n</a>\n"
        );
    }

    #[test]
    fn integer_constant_is_reencoded_without_leading_zeros() {
        use crate::lex::lex;
        use crate::source::SourceFile;
        use std::rc::Rc;

        let source = Rc::new(SourceFile::new("test.jack", "007"));
        let tokens = lex("007", source).unwrap();
        let token = tokens[0].value().clone();

        let xml = render(|e| {
            e.token(&token)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
        });
        assert_eq!(xml, "<integerConstant>7</integerConstant>\n");
    }

    #[test]
    fn integer_constant_out_of_range_is_rejected() {
        use crate::lex::lex;
        use crate::source::SourceFile;
        use std::rc::Rc;

        let source = Rc::new(SourceFile::new("test.jack", "32768"));
        let tokens = lex("32768", source).unwrap();
        let token = tokens[0].value().clone();

        let mut emitter = Emitter::new(Vec::new());
        assert!(matches!(
            emitter.token(&token),
            Err(EmitError::IntegerOutOfRange(text)) if text == "32768"
        ));
    }

    #[test]
    fn integer_constant_with_trailing_letters_is_rejected_not_panicked() {
        use crate::lex::lex;
        use crate::source::SourceFile;
        use std::rc::Rc;

        let source = Rc::new(SourceFile::new("test.jack", "1abc"));
        let tokens = lex("1abc", source).unwrap();
        let token = tokens[0].value().clone();

        let mut emitter = Emitter::new(Vec::new());
        assert!(matches!(
            emitter.token(&token),
            Err(EmitError::IntegerOutOfRange(text)) if text == "1abc"
        ));
    }

    #[test]
    fn integer_constant_exceeding_u64_is_rejected_not_panicked() {
        use crate::lex::lex;
        use crate::source::SourceFile;
        use std::rc::Rc;

        let digits = "9".repeat(25);
        let source = Rc::new(SourceFile::new("test.jack", &digits));
        let tokens = lex(&digits, source).unwrap();
        let token = tokens[0].value().clone();

        let mut emitter = Emitter::new(Vec::new());
        assert!(matches!(
            emitter.token(&token),
            Err(EmitError::IntegerOutOfRange(text)) if text == digits
        ));
    }
}
