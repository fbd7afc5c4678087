use crate::{
    error::{CompileResult, Diagnostics},
    parser::ast::{
        AssignStatement, BinaryExpression, Expression, IfStatement, Program, RepeatStatement,
        Statement, Type, WriteStatement,
    },
    semantics::visit::{walk_program, Visitor},
};

pub trait Typecheck {
    fn typecheck(&mut self, diagnostics: &mut Diagnostics) -> CompileResult<&mut Self>
    where
        Self: Sized;
}

impl Typecheck for Program {
    fn typecheck(&mut self, diagnostics: &mut Diagnostics) -> CompileResult<&mut Self> {
        let before = diagnostics.len();
        walk_program(
            self,
            &mut TypeChecker {
                diagnostics: &mut *diagnostics,
            },
        )?;
        tracing::debug!(errors = diagnostics.len() - before, "type checking finished");
        Ok(self)
    }
}

/// Post-order pass: operand types are settled before the node using them.
struct TypeChecker<'d> {
    diagnostics: &'d mut Diagnostics,
}

impl TypeChecker<'_> {
    fn require(&mut self, expr: &Expression, expected: Type, message: &str) {
        if expr.get_type() != expected {
            self.diagnostics.type_error(expr.line(), message);
        }
    }
}

impl Visitor for TypeChecker<'_> {
    fn post_expression(&mut self, expr: &mut Expression) -> CompileResult<()> {
        match expr {
            Expression::Binary(BinaryExpression {
                kind,
                lhs,
                rhs,
                line,
                _type,
            }) => {
                if lhs.get_type() != Type::Integer || rhs.get_type() != Type::Integer {
                    self.diagnostics.type_error(*line, "Op applied to non-integer");
                }
                *_type = if kind.is_comparison() {
                    Type::Boolean
                } else {
                    Type::Integer
                };
            }
            Expression::Constant(c) => c._type = Type::Integer,
            Expression::Variable(v) => v._type = Type::Integer,
            Expression::Error(_) => {}
        }
        Ok(())
    }

    fn post_statement(&mut self, stmt: &mut Statement) -> CompileResult<()> {
        match stmt {
            Statement::If(IfStatement { condition, .. }) => {
                self.require(condition, Type::Boolean, "if test is not Boolean")
            }
            Statement::Repeat(RepeatStatement { condition, .. }) => {
                self.require(condition, Type::Boolean, "repeat test is not Boolean")
            }
            Statement::Assign(AssignStatement { value, .. }) => {
                self.require(value, Type::Integer, "assignment of non-integer value")
            }
            Statement::Write(WriteStatement { value, .. }) => {
                self.require(value, Type::Integer, "write of non-integer value")
            }
            Statement::Read(_) => {}
        }
        Ok(())
    }
}
