#![allow(dead_code)]

use tinyc::machine::isa::{parse_listing, Instruction};
use tinyc::machine::sim::Machine;
use tinyc::{compile, Compilation, TraceOptions};

pub const STEP_LIMIT: usize = 1_000_000;

pub fn compile_str(src: &str) -> Compilation<Vec<u8>> {
    let mut listing = vec![];
    compile(src.as_bytes(), "test.tny", || Ok(vec![]), &mut listing, TraceOptions::default())
        .expect("compile")
}

pub fn code_of(src: &str) -> String {
    let compilation = compile_str(src);
    let messages = compilation
        .diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>();
    assert!(compilation.succeeded(), "{:?}", messages);
    String::from_utf8(compilation.code.expect("code")).expect("utf-8 listing")
}

/// Instructions of a listing sorted by location.
pub fn instructions(code: &str) -> Vec<(usize, Instruction)> {
    let mut parsed = parse_listing(code).expect("listing parses");
    parsed.sort_by_key(|(loc, _)| *loc);
    parsed
}

pub fn execute(src: &str, input: &[i32]) -> Vec<i32> {
    let code = code_of(src);
    let mut machine = Machine::load(&code).expect("listing loads");
    machine.run(input.iter().copied(), STEP_LIMIT).expect("program halts")
}
