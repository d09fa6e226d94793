//! AST lowering to x86-64 assembly
//!
//! Each node renders its own fragment through [`Emit`]. Expressions leave
//! their value in the accumulator (`rax`); locals live below `rbp` at the
//! address the parser assigned them.

use super::assembler::{
    quote_string, Assembler, AssemblyConfig, Mnemonic, Operand, OperandSize, Register, SyntaxMode,
};
use crate::error::{Error, Result};
use crate::parser::{
    AssignmentExpr, BinaryExpr, Decl, DeclRefExpr, Expr, ExprStmt, Function, Literal, PrimaryExpr,
    Program, ReturnStmt, Stmt, TypeInfo, VariableDecl,
};

/// Stack alignment required at call boundaries
const STACK_ALIGNMENT: usize = 16;

/// A node that can render itself as assembly text
pub trait Emit {
    /// Append-ready assembly fragment for this node
    fn emit(&self, cx: &mut EmitContext) -> Result<String>;
}

/// State shared across one emission pass
#[derive(Debug, Clone)]
pub struct EmitContext {
    config: AssemblyConfig,
    asm: Assembler,
    string_labels: usize,
}

impl EmitContext {
    /// Create a context for the given output configuration
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            config: config.clone(),
            asm: Assembler::new(config.syntax),
            string_labels: 0,
        }
    }

    /// Output configuration
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Line renderer for the configured dialect
    pub fn assembler(&self) -> Assembler {
        self.asm
    }

    fn next_string_label(&mut self) -> String {
        let label = format!(".LC{}", self.string_labels);
        self.string_labels += 1;
        label
    }
}

impl Emit for Program {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        let mut out = String::new();
        if cx.config.syntax == SyntaxMode::Intel && cx.config.syntax_directive {
            out.push_str(&cx.asm.directive("intel_syntax noprefix"));
        }
        for decl in &self.decls {
            out.push_str(&decl.emit(cx)?);
        }
        Ok(out)
    }
}

impl Emit for Decl {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        match self {
            Decl::Function(function) => function.emit(cx),
        }
    }
}

impl Emit for Function {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        tracing::trace!(function = %self.name, frame_size = self.frame_size, "emit function");
        let asm = cx.assembler();
        let mut out = String::new();

        let label = if self.name == cx.config.entry_point {
            let symbol = format!("{}{}", cx.config.entry_prefix, self.name);
            out.push_str(&asm.directive(&format!("globl {}", symbol)));
            symbol
        } else {
            self.name.clone()
        };
        out.push_str(&asm.label(&label));

        // Prologue
        out.push_str(&asm.instruction(Mnemonic::Push, &[Operand::Register(Register::Rbp)]));
        out.push_str(&asm.instruction(
            Mnemonic::Mov,
            &[Operand::Register(Register::Rbp), Operand::Register(Register::Rsp)],
        ));
        if self.frame_size > 0 {
            let reserved = self.frame_size.next_multiple_of(STACK_ALIGNMENT);
            out.push_str(&asm.instruction(
                Mnemonic::Sub,
                &[Operand::Register(Register::Rsp), Operand::Immediate(reserved as i64)],
            ));
        }

        for stmt in &self.body {
            out.push_str(&stmt.emit(cx)?);
        }

        // Epilogue
        out.push_str(&asm.instruction(
            Mnemonic::Mov,
            &[Operand::Register(Register::Rsp), Operand::Register(Register::Rbp)],
        ));
        out.push_str(&asm.instruction(Mnemonic::Pop, &[Operand::Register(Register::Rbp)]));
        out.push_str(&asm.instruction(Mnemonic::Ret, &[]));

        Ok(out)
    }
}

impl Emit for Stmt {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        match self {
            Stmt::VariableDecl(decl) => decl.emit(cx),
            Stmt::Return(ret) => ret.emit(cx),
            Stmt::Expr(stmt) => stmt.emit(cx),
            Stmt::Compound(body) => {
                let mut out = String::new();
                for stmt in body {
                    out.push_str(&stmt.emit(cx)?);
                }
                Ok(out)
            }
        }
    }
}

impl Emit for VariableDecl {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        match &self.init {
            None => Ok(String::new()),
            Some(init) => {
                let mut out = init.emit(cx)?;
                out.push_str(&store_accumulator(cx, &self.name, &self.ty, self.address)?);
                Ok(out)
            }
        }
    }
}

impl Emit for ReturnStmt {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        self.value.emit(cx)
    }
}

impl Emit for ExprStmt {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        self.expr.emit(cx)
    }
}

impl Emit for Expr {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        match self {
            Expr::Primary(primary) => primary.emit(cx),
            Expr::DeclRef(decl_ref) => decl_ref.emit(cx),
            Expr::Assignment(assign) => assign.emit(cx),
            Expr::Binary(binary) => binary.emit(cx),
        }
    }
}

impl Emit for PrimaryExpr {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        let asm = cx.assembler();
        match &self.literal {
            Literal::Integer(literal) => Ok(asm.instruction(
                Mnemonic::Mov,
                &[Operand::Register(Register::Rax), Operand::Immediate(literal.value)],
            )),
            Literal::String(literal) => {
                let label = cx.next_string_label();
                let mut out = asm.directive("section .rodata");
                out.push_str(&asm.label(&label));
                out.push_str(&asm.directive(&format!("asciz {}", quote_string(&literal.value))));
                out.push_str(&asm.directive("text"));
                out.push_str(&asm.instruction(
                    Mnemonic::Lea,
                    &[Operand::Register(Register::Rax), Operand::RipRelative(label)],
                ));
                Ok(out)
            }
        }
    }
}

impl Emit for DeclRefExpr {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        let size = operand_size(&self.name, &self.ty)?;
        let mnemonic = match size {
            OperandSize::Qword => Mnemonic::Mov,
            OperandSize::Dword => Mnemonic::Movsxd,
            OperandSize::Word | OperandSize::Byte => Mnemonic::Movsx,
        };
        Ok(cx.assembler().instruction(
            mnemonic,
            &[
                Operand::Register(Register::Rax),
                Operand::frame_slot(size, self.address),
            ],
        ))
    }
}

impl Emit for AssignmentExpr {
    fn emit(&self, cx: &mut EmitContext) -> Result<String> {
        let mut out = self.value.emit(cx)?;
        let dest = &self.destination;
        out.push_str(&store_accumulator(cx, &dest.name, &dest.ty, dest.address)?);
        Ok(out)
    }
}

impl Emit for BinaryExpr {
    fn emit(&self, _cx: &mut EmitContext) -> Result<String> {
        Err(Error::emit(format!(
            "binary expression `{:?}` cannot be lowered yet",
            self.op
        )))
    }
}

/// Machine width of a variable's type
fn operand_size(name: &str, ty: &TypeInfo) -> Result<OperandSize> {
    OperandSize::from_bytes(ty.size).ok_or_else(|| {
        Error::emit(format!(
            "`{}` has type `{}` of {} bytes, which no register can hold",
            name, ty.name, ty.size
        ))
    })
}

/// `mov <slot>,<accumulator>` sized to the variable
fn store_accumulator(cx: &EmitContext, name: &str, ty: &TypeInfo, address: usize) -> Result<String> {
    let size = operand_size(name, ty)?;
    Ok(cx.assembler().instruction(
        Mnemonic::Mov,
        &[
            Operand::frame_slot(size, address),
            Operand::Register(Register::accumulator(size)),
        ],
    ))
}
