use crate::{
    codegen::emitter::Emitter,
    error::{CompileError, CompileResult},
    machine::isa::{Opcode, AC, AC1, GP, MP, PC},
    parser::ast::{
        AssignStatement, BinaryExpression, BinaryExpressionKind, ConstantExpression, Expression,
        IfStatement, Program, ReadStatement, RepeatStatement, Statement, VariableExpression,
        WriteStatement,
    },
    semantics::symtab::SymbolTable,
};
use std::io::Write;

/// Translation state for one program: the emitter, the finished symbol
/// table, and the next free temporary slot below `mp`.
pub struct CodeGenerator<'s, W> {
    emitter: Emitter<W>,
    symbols: &'s SymbolTable,
    tmp_offset: i32,
}

pub trait Codegen {
    fn codegen<W: Write>(&self, gen: &mut CodeGenerator<'_, W>) -> CompileResult<()>;
}

impl<'s, W: Write> CodeGenerator<'s, W> {
    pub fn new(out: W, symbols: &'s SymbolTable, trace_code: bool) -> CodeGenerator<'s, W> {
        CodeGenerator {
            emitter: Emitter::new(out, trace_code),
            symbols,
            tmp_offset: 0,
        }
    }

    /// Emits prelude, program body and the final `HALT`. Must only be called
    /// on a program that produced no diagnostics.
    pub fn generate(mut self, program: &Program, file_name: &str) -> CompileResult<W> {
        self.emitter.emit_comment("TINY Compilation to TM Code")?;
        self.emitter.emit_comment(&format!("File: {}", file_name))?;
        self.emitter.emit_comment("Standard prelude:")?;
        self.emitter
            .emit_rm(Opcode::Ld, MP, 0, AC, "load maxaddress from location 0")?;
        self.emitter.emit_rm(Opcode::St, AC, 0, AC, "clear location 0")?;
        self.emitter.emit_comment("End of standard prelude.")?;

        program.codegen(&mut self)?;

        self.emitter.emit_comment("End of execution.")?;
        self.emitter.emit_ro(Opcode::Halt, 0, 0, 0, "")?;

        tracing::debug!(instructions = self.emitter.high_water_mark(), "generated code");
        self.emitter.finish()
    }

    fn location_of(&self, name: &str) -> CompileResult<i32> {
        self.symbols
            .lookup(name)
            .map(|loc| loc as i32)
            .ok_or_else(|| CompileError::UnknownSymbol(name.to_owned()))
    }
}

impl Codegen for Program {
    fn codegen<W: Write>(&self, gen: &mut CodeGenerator<'_, W>) -> CompileResult<()> {
        self.stmts.codegen(gen)
    }
}

impl Codegen for Vec<Statement> {
    fn codegen<W: Write>(&self, gen: &mut CodeGenerator<'_, W>) -> CompileResult<()> {
        for stmt in self {
            stmt.codegen(gen)?;
        }
        Ok(())
    }
}

impl Codegen for Statement {
    fn codegen<W: Write>(&self, gen: &mut CodeGenerator<'_, W>) -> CompileResult<()> {
        match self {
            Statement::If(IfStatement {
                condition,
                then_branch,
                else_branch,
                ..
            }) => {
                gen.emitter.emit_comment("-> if")?;
                condition.codegen(gen)?;
                let to_else = gen.emitter.reserve(1);
                gen.emitter.emit_comment("if: jump to else belongs here")?;
                then_branch.codegen(gen)?;

                let to_end = match else_branch {
                    Some(_) => {
                        let loc = gen.emitter.reserve(1);
                        gen.emitter.emit_comment("if: jump to end belongs here")?;
                        Some(loc)
                    }
                    None => None,
                };

                let current = gen.emitter.location();
                gen.emitter.patch(to_else)?;
                gen.emitter.emit_rm_abs(Opcode::Jeq, AC, current, "if: jmp to else")?;
                gen.emitter.restore();

                if let (Some(else_branch), Some(to_end)) = (else_branch, to_end) {
                    else_branch.codegen(gen)?;
                    let current = gen.emitter.location();
                    gen.emitter.patch(to_end)?;
                    gen.emitter.emit_rm_abs(Opcode::Lda, PC, current, "jmp to end")?;
                    gen.emitter.restore();
                }
                gen.emitter.emit_comment("<- if")?;
            }
            Statement::Repeat(RepeatStatement {
                body, condition, ..
            }) => {
                gen.emitter.emit_comment("-> repeat")?;
                let top = gen.emitter.location();
                gen.emitter.emit_comment("repeat: jump after body comes back here")?;
                body.codegen(gen)?;
                condition.codegen(gen)?;
                gen.emitter
                    .emit_rm_abs(Opcode::Jeq, AC, top, "repeat: jmp back to body")?;
                gen.emitter.emit_comment("<- repeat")?;
            }
            Statement::Assign(AssignStatement { name, value, .. }) => {
                gen.emitter.emit_comment("-> assign")?;
                value.codegen(gen)?;
                let loc = gen.location_of(name)?;
                gen.emitter.emit_rm(Opcode::St, AC, loc, GP, "assign: store value")?;
                gen.emitter.emit_comment("<- assign")?;
            }
            Statement::Read(ReadStatement { name, .. }) => {
                gen.emitter.emit_ro(Opcode::In, AC, 0, 0, "read integer value")?;
                let loc = gen.location_of(name)?;
                gen.emitter.emit_rm(Opcode::St, AC, loc, GP, "read: store value")?;
            }
            Statement::Write(WriteStatement { value, .. }) => {
                value.codegen(gen)?;
                gen.emitter.emit_ro(Opcode::Out, AC, 0, 0, "write ac")?;
            }
        }
        Ok(())
    }
}

impl Codegen for Expression {
    fn codegen<W: Write>(&self, gen: &mut CodeGenerator<'_, W>) -> CompileResult<()> {
        match self {
            Expression::Constant(ConstantExpression { value, .. }) => {
                gen.emitter.emit_comment("-> Const")?;
                gen.emitter.emit_rm(Opcode::Ldc, AC, *value, 0, "load const")?;
                gen.emitter.emit_comment("<- Const")?;
            }
            Expression::Variable(VariableExpression { name, .. }) => {
                gen.emitter.emit_comment("-> Id")?;
                let loc = gen.location_of(name)?;
                gen.emitter.emit_rm(Opcode::Ld, AC, loc, GP, "load id value")?;
                gen.emitter.emit_comment("<- Id")?;
            }
            Expression::Binary(BinaryExpression { kind, lhs, rhs, .. }) => {
                gen.emitter.emit_comment("-> Op")?;
                lhs.codegen(gen)?;
                gen.emitter
                    .emit_rm(Opcode::St, AC, gen.tmp_offset, MP, "op: push left")?;
                gen.tmp_offset -= 1;
                rhs.codegen(gen)?;
                gen.tmp_offset += 1;
                gen.emitter
                    .emit_rm(Opcode::Ld, AC1, gen.tmp_offset, MP, "op: load left")?;

                match kind {
                    BinaryExpressionKind::Add => gen.emitter.emit_ro(Opcode::Add, AC, AC1, AC, "op +")?,
                    BinaryExpressionKind::Sub => gen.emitter.emit_ro(Opcode::Sub, AC, AC1, AC, "op -")?,
                    BinaryExpressionKind::Mul => gen.emitter.emit_ro(Opcode::Mul, AC, AC1, AC, "op *")?,
                    BinaryExpressionKind::Div => gen.emitter.emit_ro(Opcode::Div, AC, AC1, AC, "op /")?,
                    BinaryExpressionKind::Less | BinaryExpressionKind::Equal => {
                        let (jump, comment) = match kind {
                            BinaryExpressionKind::Less => (Opcode::Jlt, "op <"),
                            _ => (Opcode::Jeq, "op =="),
                        };
                        gen.emitter.emit_ro(Opcode::Sub, AC, AC1, AC, comment)?;
                        gen.emitter.emit_rm(jump, AC, 2, PC, "br if true")?;
                        gen.emitter.emit_rm(Opcode::Ldc, AC, 0, AC, "false case")?;
                        gen.emitter.emit_rm(Opcode::Lda, PC, 1, PC, "unconditional jmp")?;
                        gen.emitter.emit_rm(Opcode::Ldc, AC, 1, AC, "true case")?;
                    }
                }
                gen.emitter.emit_comment("<- Op")?;
            }
            Expression::Error(line) => return Err(CompileError::MalformedTree(*line)),
        }
        Ok(())
    }
}
