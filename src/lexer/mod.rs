//! Lexical analysis for kcc
//!
//! Converts C source bytes into a stream of tokens.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Keyword, Punct, Token, TokenKind};
