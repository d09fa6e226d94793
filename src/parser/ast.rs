use super::state::TypeInfo;
use serde::{Deserialize, Serialize};

/// Complete translation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Module name the program was parsed from
    pub module: String,
    /// Top-level declarations in source order
    pub decls: Vec<Decl>,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    /// Function definition
    Function(Function),
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Function name as written
    pub name: String,
    /// Declared return type
    pub return_type: TypeInfo,
    /// Parameters (always empty for now)
    pub arguments: Vec<Argument>,
    /// Body statements in source order
    pub body: Vec<Stmt>,
    /// Bytes of stack used by locals
    pub frame_size: usize,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeInfo,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Local variable declaration: `int a = 1;`
    VariableDecl(VariableDecl),
    /// Return statement
    Return(ReturnStmt),
    /// Expression statement: `a = 1;`
    Expr(ExprStmt),
    /// Nested block `{ ... }`
    Compound(Vec<Stmt>),
}

/// Local variable declaration with its stack slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    /// Variable name as written
    pub name: String,
    /// Scope-qualified name
    pub qualified_name: String,
    /// Declared type
    pub ty: TypeInfo,
    /// Offset below the frame base pointer
    pub address: usize,
    /// Optional initializer
    pub init: Option<Expr>,
}

/// Return statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    /// Value to return
    pub value: Expr,
}

/// Expression evaluated for its side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    /// The expression
    pub expr: Expr,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Primary(PrimaryExpr),
    /// Variable read
    DeclRef(DeclRefExpr),
    /// Store into a variable
    Assignment(AssignmentExpr),
    /// Binary arithmetic (reserved, not lowered yet)
    Binary(BinaryExpr),
}

/// Literal wrapped as an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryExpr {
    /// The literal
    pub literal: Literal,
}

/// Literals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal
    Integer(IntegerLiteral),
    /// String literal
    String(StringLiteral),
}

/// Integer literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerLiteral {
    /// Parsed value
    pub value: i64,
}

/// String literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    /// Text between the quotes
    pub value: String,
}

/// Reference to a declared variable, resolved to its stack slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclRefExpr {
    /// Name as written
    pub name: String,
    /// Scope-qualified name of the declaration it resolved to
    pub qualified_name: String,
    /// Type of the referenced declaration
    pub ty: TypeInfo,
    /// Offset below the frame base pointer
    pub address: usize,
}

/// Assignment `dest = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentExpr {
    /// Destination variable
    pub destination: DeclRefExpr,
    /// Value to store
    pub value: Box<Expr>,
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,
}

/// Binary expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    /// Operator
    pub op: BinaryOp,
    /// Left operand
    pub left: Box<Expr>,
    /// Right operand
    pub right: Box<Expr>,
}

impl Program {
    /// Iterate over the function definitions
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.decls.iter().map(|decl| match decl {
            Decl::Function(function) => function,
        })
    }
}

impl Function {
    /// All variable declarations in the body, nested blocks included, in source order
    pub fn variables(&self) -> Vec<&VariableDecl> {
        fn collect<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a VariableDecl>) {
            for stmt in stmts {
                match stmt {
                    Stmt::VariableDecl(decl) => out.push(decl),
                    Stmt::Compound(inner) => collect(inner, out),
                    Stmt::Return(_) | Stmt::Expr(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.body, &mut out);
        out
    }
}

impl Expr {
    /// Integer literal expression
    pub fn integer(value: i64) -> Self {
        Expr::Primary(PrimaryExpr {
            literal: Literal::Integer(IntegerLiteral { value }),
        })
    }

    /// String literal expression
    pub fn string(value: impl Into<String>) -> Self {
        Expr::Primary(PrimaryExpr {
            literal: Literal::String(StringLiteral {
                value: value.into(),
            }),
        })
    }
}
