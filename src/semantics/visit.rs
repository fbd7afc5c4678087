use crate::{
    error::CompileResult,
    parser::ast::{
        AssignStatement, BinaryExpression, Expression, IfStatement, Program, RepeatStatement,
        Statement, WriteStatement,
    },
};

/// Hooks for a full traversal of the tree. For every node `pre_*` runs before
/// its children and `post_*` after them; statements in a sequence are visited
/// in order.
pub trait Visitor {
    fn pre_statement(&mut self, _stmt: &mut Statement) -> CompileResult<()> {
        Ok(())
    }

    fn post_statement(&mut self, _stmt: &mut Statement) -> CompileResult<()> {
        Ok(())
    }

    fn pre_expression(&mut self, _expr: &mut Expression) -> CompileResult<()> {
        Ok(())
    }

    fn post_expression(&mut self, _expr: &mut Expression) -> CompileResult<()> {
        Ok(())
    }
}

pub fn walk_program<V: Visitor>(program: &mut Program, visitor: &mut V) -> CompileResult<()> {
    walk_sequence(&mut program.stmts, visitor)
}

pub fn walk_sequence<V: Visitor>(stmts: &mut [Statement], visitor: &mut V) -> CompileResult<()> {
    for stmt in stmts {
        walk_statement(stmt, visitor)?;
    }
    Ok(())
}

pub fn walk_statement<V: Visitor>(stmt: &mut Statement, visitor: &mut V) -> CompileResult<()> {
    visitor.pre_statement(stmt)?;

    match stmt {
        Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            ..
        }) => {
            walk_expression(condition, visitor)?;
            walk_sequence(then_branch, visitor)?;
            if let Some(else_branch) = else_branch {
                walk_sequence(else_branch, visitor)?;
            }
        }
        Statement::Repeat(RepeatStatement {
            body, condition, ..
        }) => {
            walk_sequence(body, visitor)?;
            walk_expression(condition, visitor)?;
        }
        Statement::Assign(AssignStatement { value, .. })
        | Statement::Write(WriteStatement { value, .. }) => {
            walk_expression(value, visitor)?;
        }
        Statement::Read(_) => {}
    }

    visitor.post_statement(stmt)
}

pub fn walk_expression<V: Visitor>(expr: &mut Expression, visitor: &mut V) -> CompileResult<()> {
    visitor.pre_expression(expr)?;

    if let Expression::Binary(BinaryExpression { lhs, rhs, .. }) = expr {
        walk_expression(lhs, visitor)?;
        walk_expression(rhs, visitor)?;
    }

    visitor.post_expression(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Diagnostics, lexer::lex::Lexer, parser::recursive_descent::Parser};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Visitor for Recorder {
        fn pre_statement(&mut self, stmt: &mut Statement) -> CompileResult<()> {
            self.events.push(format!("pre:{}", stmt.line()));
            Ok(())
        }

        fn post_statement(&mut self, stmt: &mut Statement) -> CompileResult<()> {
            self.events.push(format!("post:{}", stmt.line()));
            Ok(())
        }

        fn post_expression(&mut self, expr: &mut Expression) -> CompileResult<()> {
            let label = match expr {
                Expression::Binary(b) => b.kind.symbol().to_owned(),
                Expression::Constant(c) => c.value.to_string(),
                Expression::Variable(v) => v.name.clone(),
                Expression::Error(_) => "?".to_owned(),
            };
            self.events.push(label);
            Ok(())
        }
    }

    #[test]
    fn children_are_visited_between_pre_and_post() {
        let mut diagnostics = Diagnostics::new();
        let mut program = Parser::new(
            Lexer::new("repeat\nx := x - 1\nuntil x = 0".as_bytes()),
            &mut diagnostics,
        )
        .parse()
        .unwrap();
        assert!(diagnostics.is_empty());

        let mut recorder = Recorder::default();
        walk_program(&mut program, &mut recorder).unwrap();

        assert_eq!(
            recorder.events,
            vec!["pre:1", "pre:2", "x", "1", "-", "post:2", "x", "0", "=", "post:1"]
        );
    }
}
