use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed, in bytes)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// Column one past the token's last byte
    pub fn end_column(&self) -> usize {
        self.column + self.lexeme.len()
    }

    /// Check if the token is the given punctuation
    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    /// Check if the token is the given keyword
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// All token classes produced by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Identifier that is not a reserved keyword
    Word,
    /// Decimal integer literal
    Integer,
    /// Hexadecimal integer literal (`0x...`)
    Hex,
    /// Raw text between a pair of `"` on one line, escapes undecoded
    StringText,
    /// Punctuation or operator
    Punct(Punct),
    /// Reserved C keyword
    Keyword(Keyword),
    /// End of a source line (`\n`, `\r\n` or bare `\r`)
    LineTerminator,
    /// End of file marker
    Eof,
}

/// Punctuation and operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punct {
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Semicolon ;
    Semicolon,
    /// Comma ,
    Comma,
    /// Assignment =
    Assign,
    /// Plus +
    Plus,
    /// Increment ++
    Increment,
    /// Minus -
    Minus,
    /// Decrement --
    Decrement,
    /// Star *
    Star,
    /// Slash /
    Slash,
    /// Percent %
    Percent,
    /// Single quote '
    Quote,
    /// Double quote "
    DoubleQuote,
    /// Colon :
    Colon,
    /// Question mark ?
    Question,
    /// Exclamation !
    Not,
    /// Less than <
    Lt,
    /// Greater than >
    Gt,
    /// Ampersand &
    Ampersand,
    /// Pipe |
    Pipe,
    /// Caret ^
    Caret,
    /// Tilde ~
    Tilde,
    /// Dot .
    Dot,
    /// Hash #
    Hash,
}

impl Punct {
    /// Single-byte punctuation lookup
    pub fn from_byte(b: u8) -> Option<Punct> {
        let punct = match b {
            b'{' => Punct::LeftBrace,
            b'}' => Punct::RightBrace,
            b'(' => Punct::LeftParen,
            b')' => Punct::RightParen,
            b'[' => Punct::LeftBracket,
            b']' => Punct::RightBracket,
            b';' => Punct::Semicolon,
            b',' => Punct::Comma,
            b'=' => Punct::Assign,
            b'+' => Punct::Plus,
            b'-' => Punct::Minus,
            b'*' => Punct::Star,
            b'/' => Punct::Slash,
            b'%' => Punct::Percent,
            b'\'' => Punct::Quote,
            b'"' => Punct::DoubleQuote,
            b':' => Punct::Colon,
            b'?' => Punct::Question,
            b'!' => Punct::Not,
            b'<' => Punct::Lt,
            b'>' => Punct::Gt,
            b'&' => Punct::Ampersand,
            b'|' => Punct::Pipe,
            b'^' => Punct::Caret,
            b'~' => Punct::Tilde,
            b'.' => Punct::Dot,
            b'#' => Punct::Hash,
            _ => return None,
        };
        Some(punct)
    }

    /// Whether this punctuation is a binary arithmetic operator
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
            Punct::Plus | Punct::Minus | Punct::Star | Punct::Slash | Punct::Percent
        )
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// Reserved C keywords
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Keyword {
            $(
                #[doc = concat!("`", $text, "`")]
                $variant,
            )*
        }

        impl Keyword {
            /// Get keyword from string
            pub fn lookup(s: &str) -> Option<Keyword> {
                match s {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            /// Source spelling of the keyword
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Auto => "auto",
    Break => "break",
    Case => "case",
    Char => "char",
    Const => "const",
    Continue => "continue",
    Default => "default",
    Do => "do",
    Double => "double",
    Else => "else",
    Enum => "enum",
    Extern => "extern",
    Float => "float",
    For => "for",
    Goto => "goto",
    If => "if",
    Int => "int",
    Long => "long",
    Register => "register",
    Return => "return",
    Short => "short",
    Signed => "signed",
    Sizeof => "sizeof",
    Static => "static",
    Struct => "struct",
    Switch => "switch",
    Typedef => "typedef",
    Union => "union",
    Unsigned => "unsigned",
    Void => "void",
    Volatile => "volatile",
    While => "while",
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Word => write!(f, "identifier"),
            TokenKind::Integer => write!(f, "integer"),
            TokenKind::Hex => write!(f, "hex integer"),
            TokenKind::StringText => write!(f, "string text"),
            TokenKind::Punct(p) => write!(f, "{:?}", p),
            TokenKind::Keyword(k) => write!(f, "keyword `{}`", k.as_str()),
            TokenKind::LineTerminator => write!(f, "end of line"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
