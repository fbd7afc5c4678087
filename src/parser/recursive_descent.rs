use crate::{
    error::{CompileResult, Diagnostic, Diagnostics},
    lexer::lex::{Lexer, Token, TokenKind},
    parser::ast::{
        AssignStatement, BinaryExpression, BinaryExpressionKind, ConstantExpression, Expression,
        IfStatement, Program, ReadStatement, RepeatStatement, Statement, Type,
        VariableExpression, WriteStatement,
    },
};
use std::io::BufRead;

pub struct Parser<'a, 'd, R> {
    lexer: Lexer<'a, R>,
    current: Token,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd, R: BufRead> Parser<'a, 'd, R> {
    pub fn new(lexer: Lexer<'a, R>, diagnostics: &'d mut Diagnostics) -> Parser<'a, 'd, R> {
        Parser {
            lexer,
            current: Token::new(TokenKind::EndOfFile, "", 0),
            diagnostics,
        }
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn check_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|kind| self.check(*kind))
    }

    /// Consumes the current token if it has the expected kind. Otherwise
    /// reports it and leaves it in place.
    fn consume(&mut self, kind: TokenKind) -> CompileResult<Option<Token>> {
        if self.check(kind) {
            return self.advance().map(Some);
        }
        self.unexpected_token();
        Ok(None)
    }

    fn unexpected_token(&mut self) {
        let line = self.current.line;
        if self.current.kind == TokenKind::Error {
            self.diagnostics.report(Diagnostic::Lexical {
                line,
                lexeme: self.current.lexeme.clone(),
            });
        } else {
            self.diagnostics
                .syntax(line, format!("unexpected token -> {}", self.current));
        }
    }

    pub fn parse(&mut self) -> CompileResult<Program> {
        self.advance()?;
        let stmts = self.parse_statement_sequence()?;
        if !self.check(TokenKind::EndOfFile) {
            self.diagnostics.syntax(self.current.line, "Code ends before file");
        }
        tracing::debug!(
            statements = stmts.len(),
            errors = self.diagnostics.len(),
            "parsed program"
        );
        Ok(Program { stmts })
    }

    fn parse_statement_sequence(&mut self) -> CompileResult<Vec<Statement>> {
        let mut stmts = vec![];
        if let Some(stmt) = self.parse_statement()? {
            push_statement(&mut stmts, stmt)?;
        }
        while !self.check_many(&[
            TokenKind::EndOfFile,
            TokenKind::End,
            TokenKind::Else,
            TokenKind::Until,
        ]) {
            self.consume(TokenKind::Semicolon)?;
            if let Some(stmt) = self.parse_statement()? {
                push_statement(&mut stmts, stmt)?;
            }
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> CompileResult<Option<Statement>> {
        let stmt = match self.current.kind {
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::Repeat => self.parse_repeat_statement()?,
            TokenKind::Identifier => self.parse_assign_statement()?,
            TokenKind::Read => self.parse_read_statement()?,
            TokenKind::Write => self.parse_write_statement()?,
            _ => {
                self.unexpected_token();
                self.advance()?;
                return Ok(None);
            }
        };
        Ok(Some(stmt))
    }

    fn parse_if_statement(&mut self) -> CompileResult<Statement> {
        let line = self.current.line;
        self.consume(TokenKind::If)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Then)?;
        let then_branch = self.parse_statement_sequence()?;
        let else_branch = if self.check(TokenKind::Else) {
            self.consume(TokenKind::Else)?;
            Some(self.parse_statement_sequence()?)
        } else {
            None
        };
        self.consume(TokenKind::End)?;
        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            line,
        }))
    }

    fn parse_repeat_statement(&mut self) -> CompileResult<Statement> {
        let line = self.current.line;
        self.consume(TokenKind::Repeat)?;
        let body = self.parse_statement_sequence()?;
        self.consume(TokenKind::Until)?;
        let condition = self.parse_expression()?;
        Ok(Statement::Repeat(RepeatStatement {
            body,
            condition,
            line,
        }))
    }

    fn parse_assign_statement(&mut self) -> CompileResult<Statement> {
        let line = self.current.line;
        let name = self
            .consume(TokenKind::Identifier)?
            .map(|token| token.lexeme)
            .unwrap_or_default();
        self.consume(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        Ok(Statement::Assign(AssignStatement { name, value, line }))
    }

    fn parse_read_statement(&mut self) -> CompileResult<Statement> {
        let line = self.current.line;
        self.consume(TokenKind::Read)?;
        let name = self
            .consume(TokenKind::Identifier)?
            .map(|token| token.lexeme)
            .unwrap_or_default();
        Ok(Statement::Read(ReadStatement { name, line }))
    }

    fn parse_write_statement(&mut self) -> CompileResult<Statement> {
        let line = self.current.line;
        self.consume(TokenKind::Write)?;
        let value = self.parse_expression()?;
        Ok(Statement::Write(WriteStatement { value, line }))
    }

    // At most one comparison: `a < b < c` leaves the second `<` unconsumed.
    fn parse_expression(&mut self) -> CompileResult<Expression> {
        let lhs = self.parse_simple_expression()?;
        if self.check_many(&[TokenKind::Less, TokenKind::Equal]) {
            let line = self.current.line;
            let kind = match self.advance()?.kind {
                TokenKind::Less => BinaryExpressionKind::Less,
                _ => BinaryExpressionKind::Equal,
            };
            let rhs = self.parse_simple_expression()?;
            return Ok(binary(kind, lhs, rhs, line));
        }
        Ok(lhs)
    }

    fn parse_simple_expression(&mut self) -> CompileResult<Expression> {
        let mut expr = self.parse_term()?;
        while self.check_many(&[TokenKind::Plus, TokenKind::Hyphen]) {
            let line = self.current.line;
            let kind = match self.advance()?.kind {
                TokenKind::Plus => BinaryExpressionKind::Add,
                _ => BinaryExpressionKind::Sub,
            };
            let rhs = self.parse_term()?;
            expr = binary(kind, expr, rhs, line);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> CompileResult<Expression> {
        let mut expr = self.parse_factor()?;
        while self.check_many(&[TokenKind::Star, TokenKind::Slash]) {
            let line = self.current.line;
            let kind = match self.advance()?.kind {
                TokenKind::Star => BinaryExpressionKind::Mul,
                _ => BinaryExpressionKind::Div,
            };
            let rhs = self.parse_factor()?;
            expr = binary(kind, expr, rhs, line);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> CompileResult<Expression> {
        let line = self.current.line;
        match self.current.kind {
            TokenKind::Number => {
                let token = self.advance()?;
                match token.lexeme.parse::<i32>() {
                    Ok(value) => Ok(Expression::Constant(ConstantExpression {
                        value,
                        line,
                        _type: Type::Unresolved,
                    })),
                    Err(_) => {
                        self.diagnostics
                            .syntax(line, format!("constant out of range -> {}", token));
                        Ok(Expression::Error(line))
                    }
                }
            }
            TokenKind::Identifier => {
                let token = self.advance()?;
                Ok(Expression::Variable(VariableExpression {
                    name: token.lexeme,
                    line,
                    _type: Type::Unresolved,
                }))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => {
                self.unexpected_token();
                self.advance()?;
                Ok(Expression::Error(line))
            }
        }
    }
}

fn binary(kind: BinaryExpressionKind, lhs: Expression, rhs: Expression, line: usize) -> Expression {
    Expression::Binary(BinaryExpression {
        kind,
        lhs: lhs.into(),
        rhs: rhs.into(),
        line,
        _type: Type::Unresolved,
    })
}

fn push_statement(stmts: &mut Vec<Statement>, stmt: Statement) -> CompileResult<()> {
    stmts.try_reserve(1)?;
    stmts.push(stmt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Program, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let program = Parser::new(Lexer::new(src.as_bytes()), &mut diagnostics)
            .parse()
            .unwrap();
        (program, diagnostics)
    }

    fn messages(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.iter().map(|d| d.to_string()).collect()
    }

    fn eval(expr: &Expression) -> i32 {
        match expr {
            Expression::Constant(c) => c.value,
            Expression::Binary(b) => {
                let (l, r) = (eval(&b.lhs), eval(&b.rhs));
                match b.kind {
                    BinaryExpressionKind::Add => l + r,
                    BinaryExpressionKind::Sub => l - r,
                    BinaryExpressionKind::Mul => l * r,
                    BinaryExpressionKind::Div => l / r,
                    BinaryExpressionKind::Less => (l < r) as i32,
                    BinaryExpressionKind::Equal => (l == r) as i32,
                }
            }
            _ => panic!("not a constant expression"),
        }
    }

    fn assigned_value(program: &Program) -> &Expression {
        match &program.stmts[0] {
            Statement::Assign(assign) => &assign.value,
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        let (program, diagnostics) = parse("x := 2 - 3 - 4");
        assert!(diagnostics.is_empty());
        assert_eq!(eval(assigned_value(&program)), -5);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (program, diagnostics) = parse("x := 1 + 2 * 3 - 8 / (2 + 2)");
        assert!(diagnostics.is_empty());
        assert_eq!(eval(assigned_value(&program)), 5);
    }

    #[test]
    fn parses_every_statement_kind() {
        let src = "read x;\nif x < 10 then write x else repeat x := x - 1 until x = 0 end;\nwrite x";
        let (program, diagnostics) = parse(src);
        assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
        assert_eq!(program.stmts.len(), 3);
        assert!(matches!(&program.stmts[0], Statement::Read(r) if r.name == "x" && r.line == 1));
        match &program.stmts[1] {
            Statement::If(stmt) => {
                assert_eq!(stmt.line, 2);
                assert_eq!(stmt.then_branch.len(), 1);
                let else_branch = stmt.else_branch.as_ref().unwrap();
                assert!(matches!(else_branch[0], Statement::Repeat(_)));
            }
            other => panic!("expected if, got {:?}", other),
        }
        assert_eq!(program.stmts[2].line(), 3);
    }

    #[test]
    fn tree_dump_indents_children() {
        let (program, _) = parse("if x < 1 then write 2 end");
        assert_eq!(
            program.to_string(),
            "If\n  Op: <\n    Id: x\n    Const: 1\n  Write\n    Const: 2\n"
        );
    }

    #[test]
    fn missing_token_is_reported_but_not_consumed() {
        let (program, diagnostics) = parse("x 5");
        assert_eq!(
            messages(&diagnostics),
            vec!["Syntax error at line 1: unexpected token -> NUM, val= 5"]
        );
        match &program.stmts[0] {
            Statement::Assign(assign) => {
                assert!(matches!(&assign.value, Expression::Constant(c) if c.value == 5))
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn unexpected_statement_start_is_skipped() {
        let (program, diagnostics) = parse("then; write 1");
        assert_eq!(
            messages(&diagnostics),
            vec!["Syntax error at line 1: unexpected token -> reserved word: then"]
        );
        assert_eq!(program.stmts.len(), 1);
        assert!(matches!(program.stmts[0], Statement::Write(_)));
    }

    #[test]
    fn trailing_tokens_end_the_parse_with_an_error() {
        let (_, diagnostics) = parse("write 1 end");
        assert_eq!(
            messages(&diagnostics),
            vec!["Syntax error at line 1: Code ends before file"]
        );
    }

    #[test]
    fn parsing_continues_past_an_error_to_report_later_ones() {
        let (program, diagnostics) = parse("read x;\n x := ;\nwrite 1;\n y := )");
        let lines = diagnostics.iter().map(|d| d.line()).collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 3, 4]);
        assert_eq!(program.stmts.len(), 4);
        assert!(matches!(&program.stmts[2], Statement::Write(w) if w.line == 3));
        match &program.stmts[3] {
            Statement::Assign(assign) => {
                assert_eq!(assign.name, "y");
                assert!(matches!(assign.value, Expression::Error(4)));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn comparison_is_not_associative() {
        let (_, diagnostics) = parse("if a < b < c then write 1 end");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn scanner_errors_surface_as_lexical_diagnostics() {
        let (_, diagnostics) = parse("x : 1");
        let first = diagnostics.iter().next().unwrap();
        assert!(matches!(first, Diagnostic::Lexical { line: 1, lexeme } if lexeme == ":"));
    }

    #[test]
    fn empty_program_is_an_error() {
        let (program, diagnostics) = parse("");
        assert!(program.stmts.is_empty());
        assert_eq!(
            messages(&diagnostics),
            vec!["Syntax error at line 1: unexpected token -> EOF"]
        );
    }

    #[test]
    fn oversized_constant_is_rejected() {
        let (_, diagnostics) = parse("write 99999999999");
        assert!(diagnostics.has_errors());
    }
}
