//! Análisis sintáctico.
//!
//! Parser recursivo-descendente de un solo token de lookahead, conducido
//! por la gramática de Jack. Cada producción que envuelve hijos corresponde
//! a exactamente un par `open`/`close` sobre el [`Emitter`]; las producciones
//! que no envuelven (`statement`, `subroutineCall`, `type`, `op`, `unaryOp`,
//! `keywordConst`) emiten a sus hijos directamente dentro del envoltorio que
//! las contiene.
//!
//! # Disciplina de avance
//! Al entrar a una producción, el token que le corresponde ya está
//! "actual" en el cursor; al salir, el cursor deja como actual al primer
//! token que no pertenece a la producción. Esta invariante debe sostenerse
//! en todas las producciones, incluyendo sus caminos de error (aunque en
//! un error la salida completa del archivo se descarta de todas formas).

use crate::cursor::TokenCursor;
use crate::error::ParseError;
use crate::lex::{Keyword, Token, TokenKind};
use crate::source::{Located, Location};
use crate::xml::Emitter;
use std::io::Write;

const OPERATORS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];
const UNARY_OPERATORS: &[char] = &['-', '~'];
const KEYWORD_CONSTANTS: &[Keyword] = &[Keyword::True, Keyword::False, Keyword::Null, Keyword::This];

type Parse<T> = Result<T, Located<ParseError>>;

/// Parsea un archivo `.jack` completo como una sola `class`, escribiendo
/// el árbol de sintaxis resultante como XML hacia `emitter`.
pub fn parse_class<W: Write>(
    tokens: &[Located<Token>],
    eof_location: Location,
    emitter: &mut Emitter<W>,
) -> Parse<()> {
    let mut cursor = TokenCursor::new(tokens);
    cursor.advance();

    let mut parser = Parser {
        cursor,
        emitter,
        last_location: eof_location,
    };

    parser.class()
}

struct Parser<'t, 'e, W: Write> {
    cursor: TokenCursor<'t>,
    emitter: &'e mut Emitter<W>,
    last_location: Location,
}

impl<'t, 'e, W: Write> Parser<'t, 'e, W> {
    // --- infrastructure -----------------------------------------------

    fn location(&self) -> Location {
        self.cursor
            .location()
            .ok()
            .cloned()
            .unwrap_or_else(|| self.last_location.clone())
    }

    fn fail(&self, expected: impl Into<String>) -> Located<ParseError> {
        let found = match self.cursor.token() {
            Ok(token) => token.to_string(),
            Err(_) => "end of file".to_string(),
        };

        Located::at(
            ParseError::Unexpected {
                expected: expected.into(),
                found,
            },
            self.location(),
        )
    }

    fn eof(&self, expected: impl Into<String>) -> Located<ParseError> {
        Located::at(
            ParseError::UnexpectedEof {
                expected: expected.into(),
            },
            self.location(),
        )
    }

    fn open(&mut self, tag: &str) -> Parse<()> {
        self.emitter
            .open(tag)
            .map_err(|err| Located::at(ParseError::from(crate::error::EmitError::from(err)), self.location()))
    }

    fn close(&mut self, tag: &str) -> Parse<()> {
        self.emitter
            .close(tag)
            .map_err(|err| Located::at(ParseError::from(crate::error::EmitError::from(err)), self.location()))
    }

    /// Emite el token actual como su hoja correspondiente y avanza el cursor.
    fn leaf(&mut self) -> Parse<()> {
        let token = self
            .cursor
            .token()
            .map_err(|err| Located::at(ParseError::from(err), self.location()))?
            .clone();

        self.last_location = self.location();

        self.emitter
            .token(&token)
            .map_err(|err| Located::at(ParseError::from(err), self.location()))?;

        self.cursor.advance();
        Ok(())
    }

    fn current_is_symbol(&self, c: char) -> bool {
        self.cursor.token().map(|t| t.is_symbol(c)).unwrap_or(false)
    }

    fn current_is_keyword(&self, keyword: Keyword) -> bool {
        self.cursor
            .token()
            .map(|t| t.is_keyword(keyword))
            .unwrap_or(false)
    }

    fn current_is_keyword_in(&self, keywords: &[Keyword]) -> bool {
        self.cursor
            .token()
            .ok()
            .and_then(Token::as_keyword)
            .map(|kw| keywords.contains(&kw))
            .unwrap_or(false)
    }

    fn expect_symbol(&mut self, c: char) -> Parse<()> {
        match self.cursor.token() {
            Ok(token) if token.is_symbol(c) => self.leaf(),
            Ok(_) => Err(self.fail(format!("`{}`", c))),
            Err(_) => Err(self.eof(format!("`{}`", c))),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Parse<()> {
        match self.cursor.token() {
            Ok(token) if token.is_keyword(keyword) => self.leaf(),
            Ok(_) => Err(self.fail(format!("keyword `{}`", keyword))),
            Err(_) => Err(self.eof(format!("keyword `{}`", keyword))),
        }
    }

    fn expect_keyword_in(&mut self, keywords: &[Keyword]) -> Parse<()> {
        match self.cursor.token().ok().and_then(Token::as_keyword) {
            Some(kw) if keywords.contains(&kw) => self.leaf(),
            _ if self.cursor.token().is_err() => Err(self.eof(describe_keywords(keywords))),
            _ => Err(self.fail(describe_keywords(keywords))),
        }
    }

    fn expect_identifier(&mut self) -> Parse<()> {
        match self.cursor.token() {
            Ok(token) if token.kind() == TokenKind::Identifier => self.leaf(),
            Ok(_) => Err(self.fail("identifier")),
            Err(_) => Err(self.eof("identifier")),
        }
    }

    // --- grammar productions -------------------------------------------

    fn class(&mut self) -> Parse<()> {
        self.open("class")?;
        self.expect_keyword(Keyword::Class)?;
        self.expect_identifier()?;
        self.expect_symbol('{')?;

        while self.current_is_keyword_in(&[Keyword::Static, Keyword::Field]) {
            self.class_var_dec()?;
        }

        while self.current_is_keyword_in(&[Keyword::Constructor, Keyword::Function, Keyword::Method]) {
            self.subroutine_dec()?;
        }

        self.expect_symbol('}')?;
        self.close("class")
    }

    fn class_var_dec(&mut self) -> Parse<()> {
        self.open("classVarDec")?;
        self.expect_keyword_in(&[Keyword::Static, Keyword::Field])?;
        self.type_()?;
        self.expect_identifier()?;

        while self.current_is_symbol(',') {
            self.expect_symbol(',')?;
            self.expect_identifier()?;
        }

        self.expect_symbol(';')?;
        self.close("classVarDec")
    }

    fn subroutine_dec(&mut self) -> Parse<()> {
        self.open("subroutineDec")?;
        self.expect_keyword_in(&[Keyword::Constructor, Keyword::Function, Keyword::Method])?;

        if self.current_is_keyword(Keyword::Void) {
            self.expect_keyword(Keyword::Void)?;
        } else {
            self.type_()?;
        }

        self.expect_identifier()?;
        self.expect_symbol('(')?;
        self.parameter_list()?;
        self.expect_symbol(')')?;
        self.subroutine_body()?;
        self.close("subroutineDec")
    }

    fn parameter_list(&mut self) -> Parse<()> {
        self.open("parameterList")?;

        if !self.current_is_symbol(')') {
            self.type_()?;
            self.expect_identifier()?;

            while self.current_is_symbol(',') {
                self.expect_symbol(',')?;
                self.type_()?;
                self.expect_identifier()?;
            }
        }

        self.close("parameterList")
    }

    fn subroutine_body(&mut self) -> Parse<()> {
        self.open("subroutineBody")?;
        self.expect_symbol('{')?;

        while self.current_is_keyword(Keyword::Var) {
            self.var_dec()?;
        }

        self.statements()?;
        self.expect_symbol('}')?;
        self.close("subroutineBody")
    }

    fn var_dec(&mut self) -> Parse<()> {
        self.open("varDec")?;
        self.expect_keyword(Keyword::Var)?;
        self.type_()?;
        self.expect_identifier()?;

        while self.current_is_symbol(',') {
            self.expect_symbol(',')?;
            self.expect_identifier()?;
        }

        self.expect_symbol(';')?;
        self.close("varDec")
    }

    /// `type` is not wrapped; it emits a single leaf inline.
    fn type_(&mut self) -> Parse<()> {
        match self.cursor.token() {
            Ok(token)
                if token.is_keyword(Keyword::Int)
                    || token.is_keyword(Keyword::Char)
                    || token.is_keyword(Keyword::Boolean) =>
            {
                self.leaf()
            }
            Ok(token) if token.kind() == TokenKind::Identifier => self.leaf(),
            Ok(_) => Err(self.fail("type")),
            Err(_) => Err(self.eof("type")),
        }
    }

    fn statements(&mut self) -> Parse<()> {
        self.open("statements")?;

        loop {
            match self.cursor.token().ok().and_then(Token::as_keyword) {
                Some(Keyword::Let) => self.let_statement()?,
                Some(Keyword::If) => self.if_statement()?,
                Some(Keyword::While) => self.while_statement()?,
                Some(Keyword::Do) => self.do_statement()?,
                Some(Keyword::Return) => self.return_statement()?,
                _ => break,
            }
        }

        self.close("statements")
    }

    fn let_statement(&mut self) -> Parse<()> {
        self.open("letStatement")?;
        self.expect_keyword(Keyword::Let)?;
        self.expect_identifier()?;

        if self.current_is_symbol('[') {
            self.expect_symbol('[')?;
            self.expression()?;
            self.expect_symbol(']')?;
        }

        self.expect_symbol('=')?;
        self.expression()?;
        self.expect_symbol(';')?;
        self.close("letStatement")
    }

    fn if_statement(&mut self) -> Parse<()> {
        self.open("ifStatement")?;
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.expression()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;
        self.statements()?;
        self.expect_symbol('}')?;

        if self.current_is_keyword(Keyword::Else) {
            self.expect_keyword(Keyword::Else)?;
            self.expect_symbol('{')?;
            self.statements()?;
            self.expect_symbol('}')?;
        }

        self.close("ifStatement")
    }

    fn while_statement(&mut self) -> Parse<()> {
        self.open("whileStatement")?;
        self.expect_keyword(Keyword::While)?;
        self.expect_symbol('(')?;
        self.expression()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;
        self.statements()?;
        self.expect_symbol('}')?;
        self.close("whileStatement")
    }

    fn do_statement(&mut self) -> Parse<()> {
        self.open("doStatement")?;
        self.expect_keyword(Keyword::Do)?;
        self.subroutine_call()?;
        self.expect_symbol(';')?;
        self.close("doStatement")
    }

    fn return_statement(&mut self) -> Parse<()> {
        self.open("returnStatement")?;
        self.expect_keyword(Keyword::Return)?;

        if !self.current_is_symbol(';') {
            self.expression()?;
        }

        self.expect_symbol(';')?;
        self.close("returnStatement")
    }

    /// `subroutineCall` is not wrapped. Assumes the current token is the
    /// leading identifier (either the subroutine name or the receiver).
    fn subroutine_call(&mut self) -> Parse<()> {
        self.expect_identifier()?;

        if self.current_is_symbol('.') {
            self.expect_symbol('.')?;
            self.expect_identifier()?;
        }

        self.expect_symbol('(')?;
        self.expression_list()?;
        self.expect_symbol(')')
    }

    fn expression_list(&mut self) -> Parse<()> {
        self.open("expressionList")?;

        if !self.current_is_symbol(')') {
            self.expression()?;

            while self.current_is_symbol(',') {
                self.expect_symbol(',')?;
                self.expression()?;
            }
        }

        self.close("expressionList")
    }

    fn expression(&mut self) -> Parse<()> {
        self.open("expression")?;
        self.term()?;

        while let Some(op) = self.current_operator() {
            self.expect_symbol(op)?;
            self.term()?;
        }

        self.close("expression")
    }

    fn current_operator(&self) -> Option<char> {
        self.cursor
            .token()
            .ok()
            .and_then(Token::symbol_char)
            .filter(|c| OPERATORS.contains(c))
    }

    fn term(&mut self) -> Parse<()> {
        self.open("term")?;

        let token = self.cursor.token().map_err(|_| self.eof("term"))?.clone();

        match token.kind() {
            TokenKind::IntegerConstant | TokenKind::StringConstant => self.leaf()?,

            TokenKind::Keyword if KEYWORD_CONSTANTS.contains(&token.as_keyword().unwrap()) => {
                self.leaf()?
            }

            TokenKind::Identifier => match self.cursor.peek_text() {
                Some("[") => {
                    self.expect_identifier()?;
                    self.expect_symbol('[')?;
                    self.expression()?;
                    self.expect_symbol(']')?;
                }
                Some("(") | Some(".") => self.subroutine_call()?,
                _ => self.expect_identifier()?,
            },

            TokenKind::Symbol if token.is_symbol('(') => {
                self.expect_symbol('(')?;
                self.expression()?;
                self.expect_symbol(')')?;
            }

            TokenKind::Symbol if token.symbol_char().map(|c| UNARY_OPERATORS.contains(&c)).unwrap_or(false) => {
                let c = token.symbol_char().unwrap();
                self.expect_symbol(c)?;
                self.term()?;
            }

            _ => return Err(self.fail("term")),
        }

        self.close("term")
    }
}

fn describe_keywords(keywords: &[Keyword]) -> String {
    let names: Vec<String> = keywords.iter().map(|kw| format!("`{}`", kw)).collect();
    names.join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::lex;
    use crate::source::{Position, SourceFile};
    use std::rc::Rc;

    fn parse_to_string(text: &str) -> String {
        let source = Rc::new(SourceFile::new("test.jack", text));
        let tokens = lex(text, Rc::clone(&source)).expect("lex should succeed");
        let eof = Location::new(Rc::clone(&source), Position::new(1, 1));

        let mut emitter = Emitter::new(Vec::new());
        parse_class(&tokens, eof, &mut emitter).expect("parse should succeed");

        String::from_utf8(emitter.into_inner()).unwrap()
    }

    #[test]
    fn empty_class_body() {
        let xml = parse_to_string("class X {}");
        assert_eq!(
            xml,
            "<class>\n  <keyword>class</keyword>\n  <identifier>X</identifier>\n  <symbol>{</symbol>\n  <symbol>}</symbol>\n</class>\n"
        );
    }

    #[test]
    fn do_statement_with_expression_list() {
        let source = "class X { function void main() { do Sys.print(1, 2); return; } }";
        let xml = parse_to_string(source);

        assert!(xml.contains("<doStatement>"));
        assert!(xml.contains("<expressionList>"));
        assert!(xml.contains("<symbol>,</symbol>"));
    }

    #[test]
    fn binary_expression_is_flat() {
        let source =
            "class X { function void main() { var int a; let a = 1 + 2 * 3; return; } }";
        let xml = parse_to_string(source);

        assert_eq!(xml.matches("<term>").count(), xml.matches("</term>").count());
        assert!(xml.contains("<symbol>+</symbol>"));
        assert!(xml.contains("<symbol>*</symbol>"));
    }

    #[test]
    fn return_without_expression_emits_only_keyword_and_semicolon() {
        let source = "class X { function void main() { return; } }";
        let xml = parse_to_string(source);

        let start = xml.find("<returnStatement>").unwrap();
        let end = xml.find("</returnStatement>").unwrap();
        let body = &xml[start..end];

        assert!(body.contains("<keyword>return</keyword>"));
        assert!(body.contains("<symbol>;</symbol>"));
        assert!(!body.contains("<expression>"));
    }

    #[test]
    fn array_access_in_term() {
        let source =
            "class X { function void main() { var int a; let a = b[1]; return; } }";
        let xml = parse_to_string(source);
        assert!(xml.contains("<symbol>[</symbol>"));
        assert!(xml.contains("<symbol>]</symbol>"));
    }

    #[test]
    fn unexpected_token_is_a_parse_error() {
        let source = Rc::new(SourceFile::new("test.jack", "class 5 {}"));
        let tokens = lex("class 5 {}", Rc::clone(&source)).expect("lex should succeed");
        let eof = Location::new(Rc::clone(&source), Position::new(1, 1));

        let mut emitter = Emitter::new(Vec::new());
        let result = parse_class(&tokens, eof, &mut emitter);

        assert!(matches!(
            result,
            Err(located) if matches!(located.value(), ParseError::Unexpected { .. })
        ));
    }
}
