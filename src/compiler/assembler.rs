//! x86-64 assembly text emission
//!
//! Every emitted line goes through [`Assembler`], so formatting is decided in
//! one place: directives are `.name`, labels are `name:`, instructions are
//! indented by four spaces with operands joined by a bare comma.
//!
//! ```text
//! Intel:  mov QWORD PTR [rbp-8],rax
//! AT&T:   movq %rax,-8(%rbp)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Instruction indentation
const INDENT: &str = "    ";

/// Output dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxMode {
    /// `.intel_syntax noprefix` style, destination first
    #[default]
    Intel,
    /// GNU AT&T style, source first, sigils and size suffixes
    Att,
}

/// Assembly output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Output dialect
    pub syntax: SyntaxMode,
    /// Emit `.intel_syntax noprefix` at the top of Intel output
    pub syntax_directive: bool,
    /// Function exported as the program entry point
    pub entry_point: String,
    /// Symbol prefix for the entry point (`_` for Mach-O style symbols)
    pub entry_prefix: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            syntax: SyntaxMode::Intel,
            syntax_directive: true,
            entry_point: "main".to_string(),
            entry_prefix: "_".to_string(),
        }
    }
}

/// Width of a register or memory operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandSize {
    /// 1 byte
    Byte,
    /// 2 bytes
    Word,
    /// 4 bytes
    Dword,
    /// 8 bytes
    Qword,
}

impl OperandSize {
    /// Size for a byte width, if the machine has one
    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(OperandSize::Byte),
            2 => Some(OperandSize::Word),
            4 => Some(OperandSize::Dword),
            8 => Some(OperandSize::Qword),
            _ => None,
        }
    }

    /// Width in bytes
    pub fn bytes(self) -> usize {
        match self {
            OperandSize::Byte => 1,
            OperandSize::Word => 2,
            OperandSize::Dword => 4,
            OperandSize::Qword => 8,
        }
    }

    fn intel_ptr(self) -> &'static str {
        match self {
            OperandSize::Byte => "BYTE PTR",
            OperandSize::Word => "WORD PTR",
            OperandSize::Dword => "DWORD PTR",
            OperandSize::Qword => "QWORD PTR",
        }
    }

    fn att_suffix(self) -> char {
        match self {
            OperandSize::Byte => 'b',
            OperandSize::Word => 'w',
            OperandSize::Dword => 'l',
            OperandSize::Qword => 'q',
        }
    }
}

/// Registers used by the emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    /// 64-bit accumulator
    Rax,
    /// Low 32 bits of rax
    Eax,
    /// Low 16 bits of rax
    Ax,
    /// Low 8 bits of rax
    Al,
    /// Frame base pointer
    Rbp,
    /// Stack pointer
    Rsp,
    /// Instruction pointer (RIP-relative addressing only)
    Rip,
}

impl Register {
    /// The accumulator sub-register of the given width
    pub fn accumulator(size: OperandSize) -> Self {
        match size {
            OperandSize::Byte => Register::Al,
            OperandSize::Word => Register::Ax,
            OperandSize::Dword => Register::Eax,
            OperandSize::Qword => Register::Rax,
        }
    }

    /// Register width
    pub fn size(self) -> OperandSize {
        match self {
            Register::Al => OperandSize::Byte,
            Register::Ax => OperandSize::Word,
            Register::Eax => OperandSize::Dword,
            Register::Rax | Register::Rbp | Register::Rsp | Register::Rip => OperandSize::Qword,
        }
    }

    /// Bare register name
    pub fn name(self) -> &'static str {
        match self {
            Register::Rax => "rax",
            Register::Eax => "eax",
            Register::Ax => "ax",
            Register::Al => "al",
            Register::Rbp => "rbp",
            Register::Rsp => "rsp",
            Register::Rip => "rip",
        }
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Register operand
    Register(Register),
    /// Immediate integer
    Immediate(i64),
    /// Sized memory reference `base + displacement`
    Memory {
        /// Access width
        size: OperandSize,
        /// Base register
        base: Register,
        /// Signed byte displacement
        displacement: i64,
    },
    /// Address of a label relative to rip
    RipRelative(String),
}

impl Operand {
    /// Memory slot `address` bytes below the frame base pointer
    pub fn frame_slot(size: OperandSize, address: usize) -> Self {
        Operand::Memory {
            size,
            base: Register::Rbp,
            displacement: -(address as i64),
        }
    }

    /// Width of the operand; immediates and labels have none
    pub fn size(&self) -> Option<OperandSize> {
        match self {
            Operand::Register(reg) => Some(reg.size()),
            Operand::Memory { size, .. } => Some(*size),
            Operand::Immediate(_) | Operand::RipRelative(_) => None,
        }
    }

    /// Render the operand in the given dialect
    pub fn render(&self, syntax: SyntaxMode) -> String {
        match (syntax, self) {
            (SyntaxMode::Intel, Operand::Register(reg)) => reg.name().to_string(),
            (SyntaxMode::Intel, Operand::Immediate(value)) => value.to_string(),
            (
                SyntaxMode::Intel,
                Operand::Memory {
                    size,
                    base,
                    displacement,
                },
            ) => {
                let mut out = format!("{} [{}", size.intel_ptr(), base.name());
                if *displacement != 0 {
                    let _ = write!(out, "{:+}", displacement);
                }
                out.push(']');
                out
            }
            (SyntaxMode::Intel, Operand::RipRelative(label)) => format!("[rip+{}]", label),

            (SyntaxMode::Att, Operand::Register(reg)) => format!("%{}", reg.name()),
            (SyntaxMode::Att, Operand::Immediate(value)) => format!("${}", value),
            (
                SyntaxMode::Att,
                Operand::Memory {
                    base, displacement, ..
                },
            ) => {
                if *displacement == 0 {
                    format!("(%{})", base.name())
                } else {
                    format!("{}(%{})", displacement, base.name())
                }
            }
            (SyntaxMode::Att, Operand::RipRelative(label)) => format!("{}(%rip)", label),
        }
    }
}

/// Instructions the emitter knows how to spell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mnemonic {
    /// Move
    Mov,
    /// Move with sign extension from byte or word
    Movsx,
    /// Move with sign extension from doubleword
    Movsxd,
    /// Push onto the stack
    Push,
    /// Pop from the stack
    Pop,
    /// Return from procedure
    Ret,
    /// Load effective address
    Lea,
    /// Integer subtraction
    Sub,
}

impl Mnemonic {
    fn intel_name(self) -> &'static str {
        match self {
            Mnemonic::Mov => "mov",
            Mnemonic::Movsx => "movsx",
            Mnemonic::Movsxd => "movsxd",
            Mnemonic::Push => "push",
            Mnemonic::Pop => "pop",
            Mnemonic::Ret => "ret",
            Mnemonic::Lea => "lea",
            Mnemonic::Sub => "sub",
        }
    }

    /// AT&T spelling; operands are in Intel (destination first) order
    fn att_name(self, operands: &[Operand]) -> String {
        match self {
            Mnemonic::Ret => "ret".to_string(),
            Mnemonic::Movsx | Mnemonic::Movsxd => {
                // movs<from><to>: movsbq, movswq, movslq
                let to = operands.first().and_then(Operand::size);
                let from = operands.get(1).and_then(Operand::size);
                match (from, to) {
                    (Some(from), Some(to)) => {
                        format!("movs{}{}", from.att_suffix(), to.att_suffix())
                    }
                    _ => self.intel_name().to_string(),
                }
            }
            _ => match operands.iter().find_map(Operand::size) {
                Some(size) => format!("{}{}", self.intel_name(), size.att_suffix()),
                None => self.intel_name().to_string(),
            },
        }
    }
}

/// Renders directives, labels and instructions for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assembler {
    syntax: SyntaxMode,
}

impl Assembler {
    /// Create an assembler for the given dialect
    pub fn new(syntax: SyntaxMode) -> Self {
        Self { syntax }
    }

    /// Dialect in use
    pub fn syntax(&self) -> SyntaxMode {
        self.syntax
    }

    /// `.text` followed by a newline
    pub fn directive(&self, text: &str) -> String {
        format!(".{}\n", text)
    }

    /// `name:` followed by a newline
    pub fn label(&self, name: &str) -> String {
        format!("{}:\n", name)
    }

    /// One indented instruction line.
    ///
    /// Operands are always given destination first; AT&T output reverses them.
    pub fn instruction(&self, mnemonic: Mnemonic, operands: &[Operand]) -> String {
        let (name, rendered): (String, Vec<String>) = match self.syntax {
            SyntaxMode::Intel => (
                mnemonic.intel_name().to_string(),
                operands.iter().map(|op| op.render(self.syntax)).collect(),
            ),
            SyntaxMode::Att => (
                mnemonic.att_name(operands),
                operands.iter().rev().map(|op| op.render(self.syntax)).collect(),
            ),
        };

        if rendered.is_empty() {
            format!("{}{}\n", INDENT, name)
        } else {
            format!("{}{} {}\n", INDENT, name, rendered.join(","))
        }
    }
}

/// Quote `text` for an `.asciz` directive
pub fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\{:03o}", byte);
            }
        }
    }
    out.push('"');
    out
}
