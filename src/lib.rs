pub mod cursor;
pub mod driver;
pub mod error;
pub mod lex;
pub mod parse;
pub mod source;
pub mod xml;
