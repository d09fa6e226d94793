use super::ast::{
    Argument, AssignmentExpr, Decl, DeclRefExpr, Expr, ExprStmt, Function, Program, ReturnStmt,
    Stmt, VariableDecl,
};
use super::state::{CompilerState, IdentifierKind, TypeInfo};
use crate::error::{Error, Result};
use crate::lexer::{Keyword, Punct, Token, TokenKind};

/// Deepest block or expression nesting accepted before a syntax error
pub const MAX_NESTING_DEPTH: usize = 128;

/// Recursive-descent parser for the supported C subset
///
/// Every rule returns a `Result`. Recoverable errors are recorded in the
/// borrowed [`CompilerState`] by whichever caller decides to carry on, so one
/// pass reports as many independent problems as possible. Internal errors are
/// propagated unchanged and abort the parse.
pub struct Parser<'a> {
    state: &'a mut CompilerState,
    /// Open blocks and expressions on the rule stack
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned at the state's cursor
    pub fn new(state: &'a mut CompilerState) -> Self {
        let mut parser = Parser { state, depth: 0 };
        parser.skip_line_terminators();
        parser
    }

    /// Parses the whole token buffer into a program.
    ///
    /// Returns `Err` only for internal errors; source problems end up in the
    /// state's diagnostics.
    pub fn parse(&mut self) -> Result<Program> {
        self.enter("program");
        let mut decls = Vec::new();

        while !self.is_at_end() {
            match self.function_definition() {
                Ok(function) => decls.push(Decl::Function(function)),
                Err(err) => {
                    self.state.report(err)?;
                    self.recover_top_level()?;
                }
            }
        }

        if decls.is_empty() && !self.state.has_errors() {
            let err = self.syntax_error("Expected a function definition, found end of file");
            self.state.report(err)?;
        }

        tracing::debug!(
            module = %self.state.module_name,
            declarations = decls.len(),
            errors = self.state.diagnostics.len(),
            "parse finished"
        );

        Ok(Program {
            module: self.state.module_name.clone(),
            decls,
        })
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// type identifier ( arguments ) { body }
    fn function_definition(&mut self) -> Result<Function> {
        self.enter("function_definition");

        let return_type = self.type_definition()?;
        let name = self.function_identifier(&return_type)?;
        let arguments = self.argument_declaration_list()?;

        self.state.push_scope(&name);
        self.state.reset_frame();
        let body = self.compound_statement();
        let frame_size = self.state.stack_offset;
        self.state.pop_scope();

        Ok(Function {
            name,
            return_type,
            arguments,
            body: body?,
            frame_size,
        })
    }

    /// Looks up a type name; types are never invented here
    fn type_definition(&mut self) -> Result<TypeInfo> {
        self.enter("type_definition");

        let token = self.peek().clone();
        if !matches!(token.kind, TokenKind::Word | TokenKind::Keyword(_)) {
            return Err(self.expected_error("type name"));
        }
        self.advance()?;

        match self.state.lookup_type(&token.lexeme) {
            Some(ty) => Ok(ty.clone()),
            None => Err(Self::semantic_error_at(
                &token,
                format!("Type name `{}` is not defined", token.lexeme),
            )),
        }
    }

    /// Function name, registered in the current scope
    fn function_identifier(&mut self, return_type: &TypeInfo) -> Result<String> {
        self.enter("function_identifier");

        let token = self.peek().clone();
        if token.kind != TokenKind::Word {
            return Err(self.expected_error("function name"));
        }
        self.advance()?;

        match self.state.define_identifier(
            &token.lexeme,
            IdentifierKind::Function,
            return_type.clone(),
            None,
        ) {
            Some(_) => Ok(token.lexeme),
            None => Err(Self::semantic_error_at(
                &token,
                format!("Function `{}` is already defined", token.lexeme),
            )),
        }
    }

    /// ( ) or ( void ); parameters are not supported yet
    fn argument_declaration_list(&mut self) -> Result<Vec<Argument>> {
        self.enter("argument_declaration_list");

        self.consume(Punct::LeftParen)?;
        if self.peek().is_keyword(Keyword::Void) && self.peek_next().is_punct(Punct::RightParen) {
            self.advance()?;
        }
        if !self.check(Punct::RightParen) {
            let found = Self::describe(self.peek());
            return Err(self.syntax_error(format!(
                "Expected `)`, found {}: function parameters are not supported",
                found
            )));
        }
        self.advance()?;

        Ok(Vec::new())
    }

    /// type declarator [= expr] {, declarator [= expr]} ;
    fn variable_declaration(&mut self) -> Result<Vec<Stmt>> {
        self.enter("variable_declaration");

        let ty = self.type_definition()?;
        let mut decls = Vec::new();

        loop {
            let token = self.peek().clone();
            if token.kind != TokenKind::Word {
                return Err(self.expected_error("variable name"));
            }
            self.advance()?;

            if self.state.is_defined_in_current_scope(&token.lexeme) {
                return Err(Self::semantic_error_at(
                    &token,
                    format!("Identifier `{}` is already defined", token.lexeme),
                ));
            }

            let address = self.state.allocate_local(ty.size);
            let qualified_name = self
                .state
                .define_identifier(&token.lexeme, IdentifierKind::Variable, ty.clone(), Some(address))
                .ok_or_else(|| {
                    Error::internal(format!("identifier `{}` registered twice", token.lexeme))
                })?;

            let init = if self.check(Punct::Assign) {
                self.advance()?;
                Some(self.expression()?)
            } else {
                None
            };

            decls.push(Stmt::VariableDecl(VariableDecl {
                name: token.lexeme,
                qualified_name,
                ty: ty.clone(),
                address,
                init,
            }));

            if self.check(Punct::Comma) {
                self.advance()?;
                continue;
            }
            if self.check(Punct::Semicolon) {
                self.advance()?;
                return Ok(decls);
            }
            return Err(self.expected_error("`,` or `;` after declarator"));
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// { statement* }
    fn compound_statement(&mut self) -> Result<Vec<Stmt>> {
        self.enter("compound_statement");
        self.consume(Punct::LeftBrace)?;
        self.statement_list()
    }

    /// Statements up to and including the closing brace
    fn statement_list(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();

        loop {
            if self.check(Punct::RightBrace) {
                self.advance()?;
                return Ok(stmts);
            }
            if self.is_at_end() {
                return Err(self.syntax_error("Expected `}`, found end of file"));
            }

            match self.statement() {
                Ok(mut parsed) => stmts.append(&mut parsed),
                Err(err) => {
                    self.state.report(err)?;
                    self.synchronize()?;
                }
            }
        }
    }

    fn statement(&mut self) -> Result<Vec<Stmt>> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Punct(Punct::Semicolon) => {
                self.advance()?;
                Ok(Vec::new())
            }
            TokenKind::Punct(Punct::LeftBrace) => self.nested(|parser| {
                parser.advance()?;
                parser.state.push_block_scope();
                let body = parser.statement_list();
                parser.state.pop_scope();
                Ok(vec![Stmt::Compound(body?)])
            }),
            TokenKind::Keyword(Keyword::Return) => Ok(vec![Stmt::Return(self.return_statement()?)]),
            _ if self.starts_declaration(&token) => self.variable_declaration(),
            _ => {
                let expr = self.expression()?;
                self.consume(Punct::Semicolon)?;
                Ok(vec![Stmt::Expr(ExprStmt { expr })])
            }
        }
    }

    /// A known type name, or any name directly followed by another word
    fn starts_declaration(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Word | TokenKind::Keyword(_) => {
                self.state.is_defined_type(&token.lexeme)
                    || self.peek_next().kind == TokenKind::Word
            }
            _ => false,
        }
    }

    /// return expr ;
    fn return_statement(&mut self) -> Result<ReturnStmt> {
        self.enter("return_statement");

        self.advance()?; // consume 'return'
        if self.check(Punct::Semicolon) || self.check(Punct::RightBrace) || self.is_at_end() {
            return Err(self.expected_error("expression after `return`"));
        }

        let value = self.expression()?;
        if !self.check(Punct::Semicolon) {
            return Err(self.expected_error("`;` after return value"));
        }
        self.advance()?;

        Ok(ReturnStmt { value })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self) -> Result<Expr> {
        self.nested(Self::unnested_expression)
    }

    fn unnested_expression(&mut self) -> Result<Expr> {
        if self.peek().kind == TokenKind::Word && self.peek_next().is_punct(Punct::Assign) {
            return self.assignment_expr();
        }

        let expr = self.primary_expr()?;

        if let TokenKind::Punct(op) = self.peek().kind {
            if op.is_binary_operator() {
                let lexeme = self.peek().lexeme.clone();
                return Err(self.syntax_error(format!(
                    "Binary operator `{}` is not supported",
                    lexeme
                )));
            }
        }
        Ok(expr)
    }

    /// identifier = expr
    fn assignment_expr(&mut self) -> Result<Expr> {
        self.enter("assignment_expr");

        let target = self.advance()?;
        self.advance()?; // consume '='

        // Targets resolve through the identifier store only
        let destination = self.resolve_variable(&target)?;
        let value = self.expression()?;

        Ok(Expr::Assignment(AssignmentExpr {
            destination,
            value: Box::new(value),
        }))
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        self.enter("primary_expr");

        let token = self.peek().clone();
        match token.kind {
            TokenKind::Integer | TokenKind::Hex => {
                self.advance()?;
                Ok(Expr::integer(Self::integer_value(&token, false)?))
            }
            TokenKind::Punct(Punct::Minus)
                if matches!(self.peek_next().kind, TokenKind::Integer | TokenKind::Hex) =>
            {
                self.advance()?;
                let literal = self.advance()?;
                Ok(Expr::integer(Self::integer_value(&literal, true)?))
            }
            TokenKind::Punct(Punct::DoubleQuote) => self.string_literal(),
            TokenKind::Punct(Punct::LeftParen) => {
                self.advance()?;
                let expr = self.expression()?;
                self.consume(Punct::RightParen)?;
                Ok(expr)
            }
            TokenKind::Word => {
                self.advance()?;
                Ok(Expr::DeclRef(self.resolve_variable(&token)?))
            }
            _ => Err(self.expected_error("expression")),
        }
    }

    /// Value of a decimal or hex literal token, range-checked against i64
    fn integer_value(token: &Token, negative: bool) -> Result<i64> {
        let parsed = match token.kind {
            TokenKind::Hex => {
                let digits = &token.lexeme[2..];
                if digits.is_empty() {
                    return Err(Self::syntax_error_at(
                        token,
                        format!("Hex literal `{}` has no digits", token.lexeme),
                    ));
                }
                i128::from_str_radix(digits, 16)
            }
            _ => token.lexeme.parse::<i128>(),
        };

        parsed
            .ok()
            .map(|value| if negative { -value } else { value })
            .and_then(|value| i64::try_from(value).ok())
            .ok_or_else(|| {
                let sign = if negative { "-" } else { "" };
                Self::syntax_error_at(
                    token,
                    format!(
                        "Integer literal `{}{}` is out of range",
                        sign, token.lexeme
                    ),
                )
            })
    }

    /// " text " on a single line.
    ///
    /// The scanner keeps the text between the quotes as one raw token;
    /// escapes are decoded here.
    fn string_literal(&mut self) -> Result<Expr> {
        self.enter("string_literal");

        let open = self.peek().clone();
        let cursor = self.state.cursor;
        let body = match (
            self.state.tokens.get(cursor + 1),
            self.state.tokens.get(cursor + 2),
        ) {
            (Some(text), Some(close))
                if text.kind == TokenKind::StringText && close.is_punct(Punct::DoubleQuote) =>
            {
                text.lexeme.clone()
            }
            _ => {
                return Err(Self::syntax_error_at(
                    &open,
                    "The end of '\"' is not found: missing closing `\"`",
                ))
            }
        };

        self.state.cursor = cursor + 2;
        self.advance()?;

        Ok(Expr::string(unescape(&body)))
    }

    fn resolve_variable(&self, token: &Token) -> Result<DeclRefExpr> {
        let info = match self.state.resolve_identifier(&token.lexeme) {
            Some(info) => info,
            None => {
                return Err(Self::semantic_error_at(
                    token,
                    format!("Undefined variable `{}`", token.lexeme),
                ))
            }
        };

        match (info.kind, info.address) {
            (IdentifierKind::Variable, Some(address)) => Ok(DeclRefExpr {
                name: info.name.clone(),
                qualified_name: info.qualified_name(),
                ty: info.ty.clone(),
                address,
            }),
            _ => Err(Self::semantic_error_at(
                token,
                format!("`{}` is not a variable", token.lexeme),
            )),
        }
    }

    // =========================================================================
    // Error recovery
    // =========================================================================

    /// Skip to the next statement boundary: a `;` is consumed, a `}` is not
    fn synchronize(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() || self.check(Punct::RightBrace) {
                return Ok(());
            }
            let token = self.advance()?;
            if token.is_punct(Punct::Semicolon) {
                return Ok(());
            }
        }
    }

    /// Skip past the `}` that closes the failed top-level declaration
    fn recover_top_level(&mut self) -> Result<()> {
        self.state.scope.truncate(1);
        let mut depth = 0usize;
        while !self.is_at_end() {
            let token = self.advance()?;
            if token.is_punct(Punct::LeftBrace) {
                depth += 1;
            } else if token.is_punct(Punct::RightBrace) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Skip a balanced `{ ... }` starting at the cursor, if there is one
    fn skip_block(&mut self) -> Result<()> {
        if !self.check(Punct::LeftBrace) {
            return Ok(());
        }
        let mut depth = 0usize;
        while !self.is_at_end() {
            let token = self.advance()?;
            if token.is_punct(Punct::LeftBrace) {
                depth += 1;
            } else if token.is_punct(Punct::RightBrace) {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Runs a recursive rule one level deeper, refusing past [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            let err = self.syntax_error(format!(
                "Nesting deeper than {} levels is not supported",
                MAX_NESTING_DEPTH
            ));
            // A block is dropped whole so its braces cannot close outer scopes
            self.skip_block()?;
            return Err(err);
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    fn enter(&self, rule: &'static str) {
        let token = self.peek();
        tracing::trace!(rule, line = token.line, token = %token.lexeme, "enter");
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.state.tokens[self.state.cursor]
    }

    /// The token after the current one, ignoring line terminators
    fn peek_next(&self) -> &Token {
        let last = self.state.tokens.len() - 1;
        let mut index = (self.state.cursor + 1).min(last);
        while self.state.tokens[index].kind == TokenKind::LineTerminator && index < last {
            index += 1;
        }
        &self.state.tokens[index]
    }

    /// Consume the current token.
    ///
    /// Moving past `Eof` is a bug in the rules, not in the input.
    fn advance(&mut self) -> Result<Token> {
        let token = self
            .state
            .tokens
            .get(self.state.cursor)
            .cloned()
            .ok_or_else(|| Error::internal("token cursor is outside the token buffer"))?;
        if token.kind == TokenKind::Eof {
            return Err(Error::internal(format!(
                "token cursor advanced past end of buffer at line {}",
                token.line
            )));
        }
        self.state.cursor += 1;
        self.skip_line_terminators();
        Ok(token)
    }

    fn skip_line_terminators(&mut self) {
        while self
            .state
            .tokens
            .get(self.state.cursor)
            .is_some_and(|t| t.kind == TokenKind::LineTerminator)
        {
            self.state.cursor += 1;
        }
    }

    fn check(&self, punct: Punct) -> bool {
        self.peek().is_punct(punct)
    }

    fn consume(&mut self, punct: Punct) -> Result<Token> {
        if self.check(punct) {
            self.advance()
        } else {
            Err(self.expected_error(&format!("`{}`", Self::punct_text(punct))))
        }
    }

    // =========================================================================
    // Error construction
    // =========================================================================

    fn punct_text(punct: Punct) -> &'static str {
        match punct {
            Punct::LeftBrace => "{",
            Punct::RightBrace => "}",
            Punct::LeftParen => "(",
            Punct::RightParen => ")",
            Punct::Semicolon => ";",
            Punct::Comma => ",",
            Punct::Assign => "=",
            Punct::DoubleQuote => "\"",
            _ => "punctuation",
        }
    }

    fn describe(token: &Token) -> String {
        match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::LineTerminator => "end of line".to_string(),
            _ => format!("`{}`", token.lexeme),
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Self::syntax_error_at(self.peek(), message)
    }

    fn expected_error(&self, expected: &str) -> Error {
        let found = Self::describe(self.peek());
        self.syntax_error(format!("Expected {}, found {}", expected, found))
    }

    fn syntax_error_at(token: &Token, message: impl Into<String>) -> Error {
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }

    fn semantic_error_at(token: &Token, message: impl Into<String>) -> Error {
        Error::SemanticError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }
}

/// Decodes `\"`, `\\`, `\n`, `\t`, `\0` and `\'`; any other escaped char stands for itself.
fn unescape(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('0') => value.push('\0'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::lexer::Scanner;
    use crate::parser::ast::{Literal, PrimaryExpr};

    fn parse_str(source: &str) -> (Program, CompilerState) {
        let mut scanner = Scanner::new("test.c", source.as_bytes());
        let tokens = scanner.scan_tokens();
        let mut state = CompilerState::with_tokens("test.c", tokens);
        let program = Parser::new(&mut state).parse().unwrap();
        (program, state)
    }

    fn main_body(program: &Program) -> &[Stmt] {
        &program.functions().next().expect("a function").body
    }

    #[test]
    fn test_return_literal() {
        let (program, state) = parse_str("int main() { return 2; }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
        assert_eq!(program.decls.len(), 1);

        let function = program.functions().next().unwrap();
        assert_eq!(function.name, "main");
        assert_eq!(function.return_type.name, "int");
        assert!(function.arguments.is_empty());
        assert_eq!(
            function.body,
            vec![Stmt::Return(ReturnStmt {
                value: Expr::integer(2)
            })]
        );
        assert!(state.identifier_store.contains_key("test.c::main"));
    }

    #[test]
    fn test_void_argument_list() {
        let (program, state) = parse_str("int main(void) { return 0; }");
        assert!(state.diagnostics.is_empty());
        assert_eq!(program.decls.len(), 1);
    }

    #[test]
    fn test_parameters_rejected() {
        let (_, state) = parse_str("int main(int a) { return 0; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("parameters are not supported"));
    }

    #[test]
    fn test_comma_declarations_get_increasing_slots() {
        let (program, state) = parse_str("int main() { int a = 1, b; char c; long d = 0x10; }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);

        let function = program.functions().next().unwrap();
        let slots: Vec<(&str, usize)> = function
            .variables()
            .iter()
            .map(|v| (v.name.as_str(), v.address))
            .collect();
        assert_eq!(slots, vec![("a", 8), ("b", 16), ("c", 17), ("d", 25)]);
        assert_eq!(function.frame_size, 25);
        assert_eq!(function.variables()[0].qualified_name, "test.c::main::a");
        assert_eq!(function.variables()[3].init, Some(Expr::integer(16)));
    }

    #[test]
    fn test_duplicate_identifier() {
        let (_, state) = parse_str("int main() { int a; int a; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].kind, DiagnosticKind::Semantic);
        assert!(state.diagnostics[0].message.contains("already defined"));
    }

    #[test]
    fn test_duplicate_function() {
        let (program, state) = parse_str("int main() { return 1; }\nint main() { return 2; }");
        assert_eq!(program.decls.len(), 1);
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0]
            .message
            .contains("Function `main` is already defined"));
        assert_eq!(state.diagnostics[0].line, 2);
    }

    #[test]
    fn test_undefined_type() {
        let (_, state) = parse_str("int main() { foo x; return 0; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].kind, DiagnosticKind::Semantic);
        assert!(state.diagnostics[0].message.contains("Type name `foo`"));
    }

    #[test]
    fn test_assignment_and_reference() {
        let (program, state) = parse_str("int main() { int a; a = 1; return a; }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);

        let body = main_body(&program);
        assert_eq!(body.len(), 3);
        match &body[1] {
            Stmt::Expr(ExprStmt {
                expr: Expr::Assignment(assign),
            }) => {
                assert_eq!(assign.destination.address, 8);
                assert_eq!(assign.destination.ty.size, 8);
                assert_eq!(*assign.value, Expr::integer(1));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
        match &body[2] {
            Stmt::Return(ReturnStmt {
                value: Expr::DeclRef(decl_ref),
            }) => {
                assert_eq!(decl_ref.address, 8);
                assert_eq!(decl_ref.qualified_name, "test.c::main::a");
            }
            other => panic!("Expected return of a, got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_variable() {
        let (_, state) = parse_str("int main() { b = 1; return b; }");
        assert_eq!(state.diagnostics.len(), 2);
        assert!(state
            .diagnostics
            .iter()
            .all(|d| d.message.contains("Undefined variable `b`")));
    }

    #[test]
    fn test_function_is_not_a_variable() {
        let (_, state) = parse_str("int main() { return main; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("is not a variable"));
    }

    #[test]
    fn test_shadowing_in_nested_block() {
        let (program, state) =
            parse_str("int main() { int a = 1; { int a = 2; a = 3; } return a; }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);

        let body = main_body(&program);
        let inner = match &body[1] {
            Stmt::Compound(inner) => inner,
            other => panic!("Expected block, got {:?}", other),
        };
        match &inner[1] {
            Stmt::Expr(ExprStmt {
                expr: Expr::Assignment(assign),
            }) => {
                assert_eq!(assign.destination.address, 16);
                assert_eq!(assign.destination.qualified_name, "test.c::main::block1::a");
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
        match &body[2] {
            Stmt::Return(ReturnStmt {
                value: Expr::DeclRef(decl_ref),
            }) => assert_eq!(decl_ref.address, 8),
            other => panic!("Expected return, got {:?}", other),
        }
    }

    #[test]
    fn test_string_literal() {
        let (program, state) = parse_str("int main() { return \"hello  world\"; }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
        match &main_body(&program)[0] {
            Stmt::Return(ReturnStmt {
                value:
                    Expr::Primary(PrimaryExpr {
                        literal: Literal::String(s),
                    }),
            }) => assert_eq!(s.value, "hello  world"),
            other => panic!("Expected string return, got {:?}", other),
        }
    }

    #[test]
    fn test_string_literal_keeps_raw_text() {
        let source = "int main() { return \"http://x\t/* y */ a@b \\\"q\\\\\"; }";
        let (program, state) = parse_str(source);
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
        match main_body(&program).last() {
            Some(Stmt::Return(ReturnStmt {
                value:
                    Expr::Primary(PrimaryExpr {
                        literal: Literal::String(s),
                    }),
            })) => assert_eq!(s.value, "http://x\t/* y */ a@b \"q\\"),
            other => panic!("Expected string return, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let (_, state) = parse_str("int main() { return \"abc; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].kind, DiagnosticKind::Syntax);
        assert!(state.diagnostics[0].message.contains("missing closing"));
    }

    #[test]
    fn test_integer_out_of_range() {
        let (_, state) = parse_str("int main() { return 99999999999999999999; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("out of range"));
    }

    #[test]
    fn test_negative_and_parenthesized_literals() {
        let (program, state) = parse_str("int main() { long x = -9223372036854775808; return (-0x1); }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
        let function = program.functions().next().unwrap();
        assert_eq!(function.variables()[0].init, Some(Expr::integer(i64::MIN)));
        assert_eq!(
            function.body[1],
            Stmt::Return(ReturnStmt {
                value: Expr::integer(-1)
            })
        );
    }

    #[test]
    fn test_missing_return_expression() {
        let (_, state) = parse_str("int main() { return; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0]
            .message
            .contains("Expected expression after `return`"));
    }

    #[test]
    fn test_binary_operator_rejected() {
        let (_, state) = parse_str("int main() { return 1 + 2; }");
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("Binary operator `+`"));
    }

    #[test]
    fn test_recovery_collects_independent_errors() {
        let source = "int main() {\n  int a;\n  int a;\n  return \"x;\n  b = 2;\n  return 0;\n}";
        let (program, state) = parse_str(source);
        let lines: Vec<usize> = state.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert_eq!(program.decls.len(), 1);
    }

    #[test]
    fn test_missing_closing_brace() {
        let (program, state) = parse_str("int main() { return 0;");
        assert!(program.decls.is_empty());
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("Expected `}`"));
    }

    #[test]
    fn test_unclosed_nested_block_reported_once() {
        let (_, state) = parse_str("int main() { { return 1;");
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("Expected `}`"));
    }

    #[test]
    fn test_top_level_recovery_skips_nested_blocks() {
        let (program, state) =
            parse_str("foo main() { { int a; } return 1; }\nint second() { return 2; }");
        assert_eq!(state.diagnostics.len(), 1, "{:?}", state.diagnostics);
        assert!(state.diagnostics[0].message.contains("Type name `foo` is not defined"));
        assert_eq!(program.functions().count(), 1);
        assert_eq!(state.current_scope(), "test.c");
    }

    #[test]
    fn test_block_nesting_limit() {
        let depth = MAX_NESTING_DEPTH + 50;
        let source = format!(
            "int main() {{ {} return 0; {} return 1; }}",
            "{ ".repeat(depth),
            "} ".repeat(depth)
        );
        let (program, state) = parse_str(&source);
        assert_eq!(state.diagnostics.len(), 1, "{:?}", state.diagnostics);
        assert!(state.diagnostics[0].message.contains("Nesting deeper than"));
        assert_eq!(program.functions().count(), 1);
    }

    #[test]
    fn test_block_nesting_at_limit_is_accepted() {
        let depth = MAX_NESTING_DEPTH - 1;
        let source = format!(
            "int main() {{ {} return 0; {} }}",
            "{ ".repeat(depth),
            "} ".repeat(depth)
        );
        let (_, state) = parse_str(&source);
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
    }

    #[test]
    fn test_paren_nesting_limit() {
        let depth = 10_000;
        let source = format!(
            "int main() {{ return {}1{}; }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let (_, state) = parse_str(&source);
        assert_eq!(state.diagnostics.len(), 1, "{:?}", state.diagnostics);
        assert!(state.diagnostics[0].message.contains("Nesting deeper than"));
    }

    #[test]
    fn test_empty_input() {
        let (program, state) = parse_str("  \n ");
        assert!(program.decls.is_empty());
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("Expected a function definition"));
    }

    #[test]
    fn test_multiple_functions_and_scope_reset() {
        let (program, state) =
            parse_str("int helper() { int x = 1; return x; }\nint main() { int x = 2; return x; }");
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
        let addresses: Vec<usize> = program
            .functions()
            .map(|f| f.variables()[0].address)
            .collect();
        assert_eq!(addresses, vec![8, 8]);
        assert_eq!(state.current_scope(), "test.c");
    }

    #[test]
    fn test_advance_past_eof_is_internal_error() {
        let mut state = CompilerState::new("test.c");
        let mut parser = Parser::new(&mut state);
        assert!(matches!(parser.advance(), Err(Error::InternalError(_))));
    }
}
