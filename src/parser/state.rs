//! Compiler state shared by the parsing rules
//!
//! Holds the token buffer and cursor, the type and identifier stores, the
//! scope path and the stack-frame cursor. One state is built per compilation
//! unit and is only ever touched by one parser.

use crate::error::{Diagnostic, Error, Result};
use crate::lexer::{Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Separator between scope path components in qualified names
pub const SCOPE_SEPARATOR: &str = "::";

/// Type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Type name
    pub name: String,
    /// Whether this is a pointer type
    pub is_pointer: bool,
    /// Size in bytes
    pub size: usize,
    /// Member types (empty for scalars)
    pub members: BTreeMap<String, TypeInfo>,
}

impl TypeInfo {
    /// Scalar type with the given size
    pub fn scalar(name: &str, size: usize) -> Self {
        TypeInfo {
            name: name.to_string(),
            is_pointer: false,
            size,
            members: BTreeMap::new(),
        }
    }
}

/// What an identifier names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// Local variable
    Variable,
    /// Function
    Function,
    /// Struct tag
    Struct,
}

/// Identifier descriptor stored under its qualified name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierInfo {
    /// Bare name
    pub name: String,
    /// Module the identifier was declared in
    pub module: String,
    /// Scope path at the point of declaration
    pub scope: Vec<String>,
    /// What the identifier names
    pub kind: IdentifierKind,
    /// Declared type (return type for functions)
    pub ty: TypeInfo,
    /// Stack-relative address (variables only)
    pub address: Option<usize>,
}

impl IdentifierInfo {
    /// Qualified name of this identifier
    pub fn qualified_name(&self) -> String {
        qualify(&self.scope, &self.name)
    }
}

/// Join a scope path and a bare name into a qualified name
pub fn qualify(scope: &[String], name: &str) -> String {
    let mut qualified = scope.join(SCOPE_SEPARATOR);
    qualified.push_str(SCOPE_SEPARATOR);
    qualified.push_str(name);
    qualified
}

/// Mutable state of one compilation unit
#[derive(Debug, Clone)]
pub struct CompilerState {
    /// Module (translation unit) name, the outermost scope
    pub module_name: String,
    /// Token buffer, always terminated by `Eof`
    pub tokens: Vec<Token>,
    /// Index of the current token
    pub cursor: usize,
    /// Known types by name
    pub type_store: HashMap<String, TypeInfo>,
    /// Known identifiers by qualified name
    pub identifier_store: HashMap<String, IdentifierInfo>,
    /// Active scope path, starting with the module name
    pub scope: Vec<String>,
    /// Bytes of stack allocated so far in the current function
    pub stack_offset: usize,
    /// Counter used to name nested block scopes
    pub block_counter: usize,
    /// Accumulated errors
    pub diagnostics: Vec<Diagnostic>,
    /// Accumulated warnings
    pub warnings: Vec<Diagnostic>,
}

impl CompilerState {
    /// Create a fresh state with the built-in types seeded
    pub fn new(module_name: &str) -> Self {
        let mut state = CompilerState {
            module_name: module_name.to_string(),
            tokens: vec![Token::new(TokenKind::Eof, String::new(), 1, 1)],
            cursor: 0,
            type_store: HashMap::new(),
            identifier_store: HashMap::new(),
            scope: vec![module_name.to_string()],
            stack_offset: 0,
            block_counter: 0,
            diagnostics: Vec::new(),
            warnings: Vec::new(),
        };
        for ty in [
            TypeInfo::scalar("char", 1),
            TypeInfo::scalar("int", 8),
            TypeInfo::scalar("long", 8),
            TypeInfo::scalar("float", 8),
            TypeInfo::scalar("double", 16),
        ] {
            state.type_store.insert(ty.name.clone(), ty);
        }
        state
    }

    /// Create a state over an already scanned token buffer
    pub fn with_tokens(module_name: &str, mut tokens: Vec<Token>) -> Self {
        let mut state = CompilerState::new(module_name);
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.end_column()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        state.tokens = tokens;
        state
    }

    /// Record a recoverable error as a diagnostic.
    ///
    /// Fatal errors are handed back so the caller can abort with them.
    pub fn report(&mut self, err: Error) -> Result<()> {
        match err.to_diagnostic(&self.module_name) {
            Some(diag) => {
                // Unwinding out of nested blocks can hit the same spot twice
                if self.diagnostics.last() != Some(&diag) {
                    tracing::debug!(%diag, "diagnostic recorded");
                    self.diagnostics.push(diag);
                }
                Ok(())
            }
            None => Err(err),
        }
    }

    /// Whether any error has been recorded
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Whether `name` is a known type
    pub fn is_defined_type(&self, name: &str) -> bool {
        self.type_store.contains_key(name)
    }

    /// Look up a type by name
    pub fn lookup_type(&self, name: &str) -> Option<&TypeInfo> {
        self.type_store.get(name)
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Current scope path joined with the separator
    pub fn current_scope(&self) -> String {
        self.scope.join(SCOPE_SEPARATOR)
    }

    /// Qualified name of `name` in the innermost scope
    pub fn qualify(&self, name: &str) -> String {
        qualify(&self.scope, name)
    }

    /// Enter a named scope
    pub fn push_scope(&mut self, name: &str) {
        self.scope.push(name.to_string());
    }

    /// Enter a fresh anonymous block scope and return its name
    pub fn push_block_scope(&mut self) -> String {
        self.block_counter += 1;
        let name = format!("block{}", self.block_counter);
        self.push_scope(&name);
        name
    }

    /// Leave the innermost scope; the module scope is never popped
    pub fn pop_scope(&mut self) {
        if self.scope.len() > 1 {
            self.scope.pop();
        }
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Whether `name` is defined in the innermost scope
    pub fn is_defined_in_current_scope(&self, name: &str) -> bool {
        self.identifier_store.contains_key(&self.qualify(name))
    }

    /// Register an identifier in the innermost scope.
    ///
    /// Returns the qualified name, or `None` when the innermost scope already
    /// defines `name`. Enclosing scopes are not consulted, so shadowing works.
    pub fn define_identifier(
        &mut self,
        name: &str,
        kind: IdentifierKind,
        ty: TypeInfo,
        address: Option<usize>,
    ) -> Option<String> {
        let qualified = self.qualify(name);
        if self.identifier_store.contains_key(&qualified) {
            return None;
        }
        let info = IdentifierInfo {
            name: name.to_string(),
            module: self.module_name.clone(),
            scope: self.scope.clone(),
            kind,
            ty,
            address,
        };
        self.identifier_store.insert(qualified.clone(), info);
        Some(qualified)
    }

    /// Resolve `name` from the innermost scope outward
    pub fn resolve_identifier(&self, name: &str) -> Option<&IdentifierInfo> {
        (1..=self.scope.len())
            .rev()
            .find_map(|depth| self.identifier_store.get(&qualify(&self.scope[..depth], name)))
    }

    // =========================================================================
    // Stack frame
    // =========================================================================

    /// Start a new function frame
    pub fn reset_frame(&mut self) {
        self.stack_offset = 0;
    }

    /// Reserve `size` bytes and return the slot's offset below the base pointer
    pub fn allocate_local(&mut self, size: usize) -> usize {
        self.stack_offset += size;
        self.stack_offset
    }
}
