//! Cursor de tokens con un token de lookahead.
//!
//! Envuelve la secuencia de tokens ya producida por el lexer y le da al
//! parser las únicas operaciones que necesita: saber si queda algo por leer,
//! avanzar al siguiente token, y consultar tanto el token actual como el
//! siguiente sin consumirlo.

use crate::error::CursorError;
use crate::lex::{Token, TokenKind};
use crate::source::{Located, Location};

/// Cursor sobre una secuencia de tokens ya lexeada.
///
/// Antes de la primera llamada a [`TokenCursor::advance`], no hay ningún
/// token "actual"; todos los accesores fallan con [`CursorError::PastEnd`]
/// hasta entonces.
pub struct TokenCursor<'t> {
    tokens: &'t [Located<Token>],
    position: Option<usize>,
}

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t [Located<Token>]) -> Self {
        TokenCursor {
            tokens,
            position: None,
        }
    }

    fn next_index(&self) -> usize {
        self.position.map_or(0, |position| position + 1)
    }

    /// `true` si queda al menos un token sin leer.
    pub fn has_more(&self) -> bool {
        self.next_index() < self.tokens.len()
    }

    /// Avanza el cursor, haciendo actual al siguiente token.
    pub fn advance(&mut self) {
        self.position = Some(self.next_index());
    }

    fn current(&self) -> Result<&'t Located<Token>, CursorError> {
        self.position
            .and_then(|position| self.tokens.get(position))
            .ok_or(CursorError::PastEnd)
    }

    pub fn token(&self) -> Result<&'t Token, CursorError> {
        self.current().map(Located::value)
    }

    pub fn kind(&self) -> Result<TokenKind, CursorError> {
        self.token().map(Token::kind)
    }

    pub fn text(&self) -> Result<&'t str, CursorError> {
        self.token().map(Token::text)
    }

    pub fn location(&self) -> Result<&'t Location, CursorError> {
        self.current().map(Located::location)
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.next_index()).map(Located::value)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(Token::kind)
    }

    pub fn peek_text(&self) -> Option<&'t str> {
        self.peek().map(Token::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::lex;
    use crate::source::SourceFile;
    use std::rc::Rc;

    fn tokens(text: &str) -> Vec<Located<Token>> {
        let source = Rc::new(SourceFile::new("test.jack", text));
        lex(text, source).expect("lex should succeed")
    }

    #[test]
    fn starts_with_no_current_token() {
        let tokens = tokens("class X {}");
        let cursor = TokenCursor::new(&tokens);
        assert!(matches!(cursor.token(), Err(CursorError::PastEnd)));
    }

    #[test]
    fn advance_exposes_tokens_in_order() {
        let tokens = tokens("class X {}");
        let mut cursor = TokenCursor::new(&tokens);

        cursor.advance();
        assert_eq!(cursor.text().unwrap(), "class");

        cursor.advance();
        assert_eq!(cursor.text().unwrap(), "X");
    }

    #[test]
    fn peek_does_not_consume() {
        let tokens = tokens("class X {}");
        let mut cursor = TokenCursor::new(&tokens);
        cursor.advance();

        assert_eq!(cursor.peek_text(), Some("X"));
        assert_eq!(cursor.text().unwrap(), "class");
    }

    #[test]
    fn has_more_is_false_past_the_last_token() {
        let tokens = tokens("}");
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.has_more());

        cursor.advance();
        assert!(!cursor.has_more());

        cursor.advance();
        assert!(matches!(cursor.token(), Err(CursorError::PastEnd)));
    }
}
