//! End-to-end tests: C source in, assembly text or diagnostics out

use kcc::{
    AssemblyConfig, CompileOptions, Compiler, Diagnostic, DiagnosticKind, Error, SyntaxMode,
};

fn compile_ok(source: &str) -> String {
    match kcc::compile(source) {
        Ok(asm) => asm,
        Err(Error::CompilationFailed(diagnostics)) => {
            let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
            panic!("unexpected diagnostics:\n{}", rendered.join("\n"))
        }
        Err(err) => panic!("unexpected error: {}", err),
    }
}

fn diagnostics(source: &str) -> Vec<Diagnostic> {
    match kcc::compile(source) {
        Err(Error::CompilationFailed(diagnostics)) => diagnostics,
        other => panic!("expected diagnostics, got {:?}", other),
    }
}

fn compile_with(config: AssemblyConfig, source: &str) -> String {
    Compiler::new(CompileOptions { assembly: config })
        .compile("main.c", source.as_bytes())
        .unwrap()
        .assembly
        .expect("assembly")
}

// ====================
// Golden Output
// ====================

#[test]
fn test_return_constant_intel() {
    let asm = compile_ok("int main() { return 2; }");
    assert_eq!(
        asm,
        ".intel_syntax noprefix\n\
         .globl _main\n\
         _main:\n\
         \x20   push rbp\n\
         \x20   mov rbp,rsp\n\
         \x20   mov rax,2\n\
         \x20   mov rsp,rbp\n\
         \x20   pop rbp\n\
         \x20   ret\n"
    );
}

#[test]
fn test_return_constant_att() {
    let config = AssemblyConfig {
        syntax: SyntaxMode::Att,
        ..AssemblyConfig::default()
    };
    let asm = compile_with(config, "int main() { return 2; }");
    assert_eq!(
        asm,
        ".globl _main\n_main:\n    pushq %rbp\n    movq %rsp,%rbp\n    movq $2,%rax\n    movq %rbp,%rsp\n    popq %rbp\n    ret\n"
    );
}

#[test]
fn test_variable_return() {
    let asm = compile_ok("int main() { int a = 5; return a; }");
    assert_eq!(
        asm,
        ".intel_syntax noprefix\n.globl _main\n_main:\n    push rbp\n    mov rbp,rsp\n    sub rsp,16\n    mov rax,5\n    mov QWORD PTR [rbp-8],rax\n    mov rax,QWORD PTR [rbp-8]\n    mov rsp,rbp\n    pop rbp\n    ret\n"
    );
}

#[test]
fn test_assignment_store_and_load_share_slot() {
    let asm = compile_ok("int main() { int a; a = 1; return a; }");
    assert!(asm.contains("    mov rax,1\n    mov QWORD PTR [rbp-8],rax\n    mov rax,QWORD PTR [rbp-8]\n"));
}

#[test]
fn test_no_directive_and_custom_prefix() {
    let config = AssemblyConfig {
        syntax_directive: false,
        entry_prefix: String::new(),
        ..AssemblyConfig::default()
    };
    let asm = compile_with(config, "int main(void) { return 0; }");
    assert!(asm.starts_with(".globl main\nmain:\n"));
}

#[test]
fn test_hex_literal() {
    let asm = compile_ok("long main() { return 0xff; }");
    assert!(asm.contains("    mov rax,255\n"));
}

#[test]
fn test_comments_and_crlf() {
    let asm = compile_ok("// entry\r\nint main() {\r\n  /* value */ return 3;\r\n}\r\n");
    assert!(asm.contains("    mov rax,3\n"));
}

// ====================
// Frame Layout
// ====================

#[test]
fn test_char_store_and_load() {
    let asm = compile_ok("int main() { int a = 1; char c = 2; return c; }");
    assert!(asm.contains("    mov QWORD PTR [rbp-8],rax\n"));
    assert!(asm.contains("    mov BYTE PTR [rbp-9],al\n"));
    assert!(asm.contains("    movsx rax,BYTE PTR [rbp-9]\n"));
    assert!(asm.contains("    sub rsp,16\n"));
}

#[test]
fn test_chained_assignment() {
    let asm = compile_ok("int main() { int a; int b; a = b = 7; return a; }");
    assert!(asm.contains(
        "    mov rax,7\n    mov QWORD PTR [rbp-16],rax\n    mov QWORD PTR [rbp-8],rax\n"
    ));
}

#[test]
fn test_initializer_reads_earlier_variable() {
    let asm = compile_ok("int main() { int a = 4; int b = a; return b; }");
    assert!(asm.contains("    mov rax,QWORD PTR [rbp-8]\n    mov QWORD PTR [rbp-16],rax\n"));
}

#[test]
fn test_shadowed_variable_gets_own_slot() {
    let asm = compile_ok("int main() { int a = 1; { int a = 2; } return a; }");
    assert!(asm.contains("    mov QWORD PTR [rbp-16],rax\n"));
    assert!(asm.ends_with("    mov rax,QWORD PTR [rbp-8]\n    mov rsp,rbp\n    pop rbp\n    ret\n"));
}

#[test]
fn test_string_literal_return() {
    let asm = compile_ok("int main() { return \"hi there\"; }");
    assert!(asm.contains(
        ".section .rodata\n.LC0:\n.asciz \"hi there\"\n.text\n    lea rax,[rip+.LC0]\n"
    ));
}

#[test]
fn test_string_with_slashes() {
    let asm = compile_ok("int main() { return \"http://x\"; }");
    assert!(asm.contains(".asciz \"http://x\"\n"));
}

#[test]
fn test_string_with_non_c_characters() {
    let asm = compile_ok("int main() { return \"a@b $5 \\\\ \u{e9}\"; }");
    assert!(asm.contains(".asciz \"a@b $5 \\\\ \\303\\251\"\n"), "{}", asm);
}

#[test]
fn test_string_with_escaped_quote() {
    let asm = compile_ok(r#"int main() { return "a\"b"; }"#);
    assert!(asm.contains(".asciz \"a\\\"b\"\n"), "{}", asm);
}

#[test]
fn test_string_keeps_tab_and_comment_text() {
    let asm = compile_ok("int main() { return \"a\tb /* c */\"; }");
    assert!(asm.contains(".asciz \"a\\tb /* c */\"\n"), "{}", asm);
}

#[test]
fn test_helper_function_label() {
    let asm = compile_ok("int helper() { return 1; }\nint main() { return 2; }");
    let helper = asm.find("helper:\n").expect("helper label");
    let main = asm.find("_main:\n").expect("main label");
    assert!(helper < main);
    assert_eq!(asm.matches(".globl").count(), 1);
}

// ====================
// Diagnostics
// ====================

#[test]
fn test_duplicate_local() {
    let diags = diagnostics("int main() { int a; int a; }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::Semantic);
    assert!(diags[0].message.contains("already defined"));
    assert_eq!(
        diags[0].to_string(),
        "main.c:1:25: semantic error: Identifier `a` is already defined"
    );
}

#[test]
fn test_unterminated_string() {
    let diags = diagnostics("int main() { return \"abc; }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::Syntax);
}

#[test]
fn test_unknown_type() {
    let diags = diagnostics("short main() { return 0; }");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("Type name `short` is not defined"));
}

#[test]
fn test_multiple_errors_reported_together() {
    let source = "int main() {\n  int x;\n  y = 1;\n  int x;\n  return;\n}\n";
    let diags = diagnostics(source);
    let lines: Vec<usize> = diags.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![3, 4, 5]);
}

#[test]
fn test_lexical_error_blocks_assembly() {
    let diags = diagnostics("int main() { return 1 $ ; }");
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::Lex));
}

#[test]
fn test_unterminated_comment() {
    let diags = diagnostics("int main() { return 1; } /* trailing");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("unterminated block comment"));
}

#[test]
fn test_empty_source() {
    let diags = diagnostics("");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::Syntax);
}

#[test]
fn test_recovery_after_bad_return_type() {
    let diags = diagnostics("foo main() { { int a; } return 1; }");
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert!(diags[0].message.contains("Type name `foo` is not defined"));
}

#[test]
fn test_deep_parentheses_are_rejected() {
    let depth = 100_000;
    let source = format!(
        "int main() {{ return {}1{}; }}",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let diags = diagnostics(&source);
    assert_eq!(diags.len(), 1, "{:?}", diags);
    assert_eq!(diags[0].kind, DiagnosticKind::Syntax);
    assert!(diags[0].message.contains("Nesting deeper than"));
}

#[test]
fn test_control_character_only_warns() {
    let output = Compiler::new(CompileOptions::default())
        .compile("main.c", b"int main() {\x0c return 0; }")
        .unwrap();
    assert!(output.is_success());
    assert_eq!(output.warnings.len(), 1);
}

// ====================
// Determinism
// ====================

#[test]
fn test_compilation_is_repeatable() {
    let source = "int main() { int a = 1; char b = 2; { long a = 3; b = a; } return \"s\"; }";
    let first = compile_ok(source);
    let second = compile_ok(source);
    assert_eq!(first, second);
}
