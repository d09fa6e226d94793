//! # kcc - a small C compiler
//!
//! A front end for a minimal C subset plus an x86-64 assembly emitter. Source
//! bytes are scanned into tokens, parsed by a recursive-descent parser that
//! resolves types and identifiers and lays out stack frames as it goes, and
//! the resulting AST renders itself as Intel or AT&T assembly text.
//!
//! ## Quick Start
//!
//! ```rust
//! # fn main() -> kcc::Result<()> {
//! let asm = kcc::compile("int main() { return 2; }")?;
//! assert!(asm.contains("_main:\n"));
//! assert!(asm.contains("    mov rax,2\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Pipeline by hand
//!
//! ```rust
//! use kcc::{CompilerState, Emit, EmitContext, AssemblyConfig, Parser, Scanner};
//!
//! # fn main() -> kcc::Result<()> {
//! let mut scanner = Scanner::new("main.c", b"int main() { int a = 1; return a; }");
//! let tokens = scanner.scan_tokens();
//!
//! let mut state = CompilerState::with_tokens("main.c", tokens);
//! let program = Parser::new(&mut state).parse()?;
//! assert!(state.diagnostics.is_empty());
//!
//! let asm = program.emit(&mut EmitContext::new(&AssemblyConfig::default()))?;
//! assert!(asm.contains("    mov rax,QWORD PTR [rbp-8]\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! - Types: `char` (1 byte), `int` and `long` (8), `float` (8), `double` (16)
//! - Function definitions with an empty or `void` parameter list
//! - Local declarations with initializers, comma-separated declarators
//! - Assignment, `return`, nested blocks with shadowing
//! - Decimal, hex and string literals
//!
//! ## Error Handling
//!
//! Lexical, syntax and semantic problems are collected as [`Diagnostic`]s so
//! one run reports all of them; no assembly is produced while any exist.
//! Internal faults and emission failures abort with an [`Error`].
//!
//! ```rust
//! use kcc::Error;
//!
//! match kcc::compile("int main() { int a; int a; return 0; }") {
//!     Err(Error::CompilationFailed(diagnostics)) => {
//!         assert_eq!(diagnostics.len(), 1);
//!         assert!(diagnostics[0].message.contains("already defined"));
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

/// Version of the kcc compiler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Module name used when none is given
pub const DEFAULT_MODULE: &str = "main.c";

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;

// Re-export main types
pub use compiler::{
    AssemblyConfig, CompileOptions, CompileOutput, Compiler, Emit, EmitContext, SyntaxMode,
};
pub use error::{Diagnostic, DiagnosticKind, Error, ErrorSeverity, Result, Severity};
pub use lexer::{Keyword, Punct, Scanner, Token, TokenKind};
pub use parser::{CompilerState, Parser, Program};

/// Compile `source` with default options.
///
/// Fails with [`Error::CompilationFailed`] carrying every diagnostic when the
/// source has errors.
pub fn compile(source: &str) -> Result<String> {
    let output =
        Compiler::new(CompileOptions::default()).compile(DEFAULT_MODULE, source.as_bytes())?;
    match output.assembly {
        Some(assembly) => Ok(assembly),
        None => Err(Error::CompilationFailed(output.diagnostics)),
    }
}
