use crate::{
    codegen::gen::CodeGenerator,
    config::{Stage, TraceOptions},
    error::{CompileResult, Diagnostic, Diagnostics},
    lexer::lex::{Lexer, TokenKind},
    parser::{ast::Program, recursive_descent::Parser},
    semantics::{symtab::SymbolTable, typechecker::Typecheck},
};
use std::io::{self, BufRead, Write};

/// What one run of the pipeline produced. `code` is only present when every
/// stage through code generation finished without diagnostics.
#[derive(Debug)]
pub struct Compilation<W> {
    pub diagnostics: Diagnostics,
    pub program: Program,
    pub symbols: Option<SymbolTable>,
    pub code: Option<W>,
}

impl<W> Compilation<W> {
    fn stopped(diagnostics: Diagnostics, program: Program, symbols: Option<SymbolTable>) -> Self {
        Compilation {
            diagnostics,
            program,
            symbols,
            code: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Runs scan/parse, analysis and code generation over `source`, each stage
/// starting only if no diagnostics were reported before it and
/// `options.stop_after` has not been reached. `open_code` is called to obtain
/// the code sink right before generation.
pub fn compile<R, W, F>(
    source: R,
    file_name: &str,
    open_code: F,
    listing: &mut dyn Write,
    options: TraceOptions,
) -> CompileResult<Compilation<W>>
where
    R: BufRead,
    W: Write,
    F: FnOnce() -> io::Result<W>,
{
    let mut diagnostics = Diagnostics::new();

    if options.stop_after == Stage::Scan {
        let lexer = Lexer::new(source).with_listing(&mut *listing, options);
        for token in lexer {
            let token = token?;
            if token.kind == TokenKind::Error {
                diagnostics.report(Diagnostic::Lexical {
                    line: token.line,
                    lexeme: token.lexeme,
                });
            }
        }
        tracing::info!(errors = diagnostics.len(), "scan finished");
        return Ok(Compilation::stopped(diagnostics, Program::default(), None));
    }

    let mut program = {
        let lexer = Lexer::new(source).with_listing(&mut *listing, options);
        Parser::new(lexer, &mut diagnostics).parse()?
    };

    if options.trace_parse {
        writeln!(listing, "\nSyntax tree:")?;
        write!(listing, "{}", program)?;
    }

    if diagnostics.has_errors() {
        tracing::info!(errors = diagnostics.len(), "parse failed, skipping analysis");
        return Ok(Compilation::stopped(diagnostics, program, None));
    }
    if options.stop_after == Stage::Parse {
        return Ok(Compilation::stopped(diagnostics, program, None));
    }

    if options.trace_analyze {
        writeln!(listing, "\nBuilding Symbol Table...")?;
    }
    let symbols = SymbolTable::build(&mut program)?;
    if options.trace_analyze {
        writeln!(listing, "\nSymbol table:\n")?;
        write!(listing, "{}", symbols)?;
        writeln!(listing, "\nChecking Types...")?;
    }
    program.typecheck(&mut diagnostics)?;
    if options.trace_analyze {
        writeln!(listing, "\nType Checking Finished")?;
    }

    if diagnostics.has_errors() {
        tracing::info!(errors = diagnostics.len(), "analysis failed, skipping code generation");
        return Ok(Compilation::stopped(diagnostics, program, Some(symbols)));
    }
    if options.stop_after == Stage::Analyze {
        return Ok(Compilation::stopped(diagnostics, program, Some(symbols)));
    }

    let code = CodeGenerator::new(open_code()?, &symbols, options.trace_code)
        .generate(&program, file_name)?;
    tracing::info!(file = file_name, symbols = symbols.len(), "compilation finished");

    Ok(Compilation {
        diagnostics,
        program,
        symbols: Some(symbols),
        code: Some(code),
    })
}
