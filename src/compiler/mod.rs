//! # kcc Compiler - C to x86-64 assembly
//!
//! Drives the pipeline over one translation unit and renders the result as
//! assembly text.
//!
//! ## Architecture
//!
//! ```text
//! C Source → Tokens → AST (+ types, scopes, stack slots) → Assembly text
//! ```
//!
//! ## Usage
//!
//! ```
//! use kcc::compiler::{CompileOptions, Compiler};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let output = compiler.compile("main.c", b"int main() { return 2; }")?;
//! assert!(output.assembly.unwrap().contains("mov rax,2"));
//! # Ok::<(), kcc::Error>(())
//! ```

pub mod assembler;
pub mod codegen;

pub use assembler::{
    quote_string, Assembler, AssemblyConfig, Mnemonic, Operand, OperandSize, Register, SyntaxMode,
};
pub use codegen::{Emit, EmitContext};

use crate::error::{Diagnostic, Result};
use crate::lexer::Scanner;
use crate::parser::{CompilerState, Parser, Program};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Compilation options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Assembly output settings
    pub assembly: AssemblyConfig,
}

/// Compilation result
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// Assembly text; `None` whenever `diagnostics` is non-empty
    pub assembly: Option<String>,
    /// Errors found in the source, ordered by position
    pub diagnostics: Vec<Diagnostic>,
    /// Warnings generated during compilation
    pub warnings: Vec<Diagnostic>,
}

impl CompileOutput {
    /// Whether assembly was produced
    pub fn is_success(&self) -> bool {
        self.assembly.is_some()
    }
}

/// C to x86-64 assembly compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options this compiler was built with
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Scan and parse `source` without emitting.
    ///
    /// The returned state carries every lexical and parse diagnostic.
    pub fn parse(&self, module: &str, source: &[u8]) -> Result<(Program, CompilerState)> {
        // Phase 1: Scan
        let mut scanner = Scanner::new(module, source);
        let tokens = scanner.scan_tokens();

        let mut state = CompilerState::with_tokens(module, tokens);
        state.diagnostics.extend_from_slice(scanner.diagnostics());
        state.warnings.extend_from_slice(scanner.warnings());

        // Phase 2: Parse, resolve names and lay out frames
        let program = Parser::new(&mut state).parse()?;
        state
            .diagnostics
            .sort_by_key(|diag| (diag.line, diag.column));

        Ok((program, state))
    }

    /// Compile one translation unit to assembly text
    pub fn compile(&self, module: &str, source: &[u8]) -> Result<CompileOutput> {
        tracing::debug!(module, bytes = source.len(), "compiling");

        let (program, state) = self.parse(module, source)?;
        if state.has_errors() {
            tracing::debug!(
                module,
                diagnostics = state.diagnostics.len(),
                "compilation failed, no assembly emitted"
            );
            return Ok(CompileOutput {
                assembly: None,
                diagnostics: state.diagnostics,
                warnings: state.warnings,
            });
        }

        // Phase 3: Emit
        let mut cx = EmitContext::new(&self.options.assembly);
        let assembly = program.emit(&mut cx)?;
        tracing::debug!(
            module,
            functions = program.decls.len(),
            bytes = assembly.len(),
            "emitted assembly"
        );

        Ok(CompileOutput {
            assembly: Some(assembly),
            diagnostics: state.diagnostics,
            warnings: state.warnings,
        })
    }

    /// Compile and write the assembly to `sink` when compilation succeeds
    pub fn compile_to<W: Write>(
        &self,
        module: &str,
        source: &[u8],
        sink: &mut W,
    ) -> Result<CompileOutput> {
        let output = self.compile(module, source)?;
        if let Some(assembly) = &output.assembly {
            sink.write_all(assembly.as_bytes())?;
            sink.flush()?;
        }
        Ok(output)
    }
}
