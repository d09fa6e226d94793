use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kcc::{CompileOptions, Compiler, CompilerState, Parser, Scanner};

fn sample_program(locals: usize) -> String {
    let mut body = String::new();
    for i in 0..locals {
        body.push_str(&format!("    long v{} = {};\n", i, i * 3));
        body.push_str(&format!("    {{ char v{} = {}; }}\n", i, i % 100));
    }
    format!(
        "/* generated */\nint main() {{\n{}    return v0;\n}}\n",
        body
    )
}

fn lexer_benchmark(c: &mut Criterion) {
    let source = sample_program(200);

    c.bench_function("scan 200 locals", |b| {
        b.iter(|| Scanner::new("bench.c", black_box(source.as_bytes())).scan_tokens())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let source = sample_program(200);
    let tokens = Scanner::new("bench.c", source.as_bytes()).scan_tokens();

    c.bench_function("parse 200 locals", |b| {
        b.iter(|| {
            let mut state = CompilerState::with_tokens("bench.c", black_box(tokens.clone()));
            Parser::new(&mut state).parse().unwrap()
        })
    });
}

fn compile_benchmark(c: &mut Criterion) {
    let source = sample_program(200);
    let compiler = Compiler::new(CompileOptions::default());

    c.bench_function("compile 200 locals", |b| {
        b.iter(|| {
            compiler
                .compile("bench.c", black_box(source.as_bytes()))
                .unwrap()
        })
    });
}

criterion_group!(benches, lexer_benchmark, parser_benchmark, compile_benchmark);
criterion_main!(benches);
