use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Unresolved,
    Integer,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    If(IfStatement),
    Repeat(RepeatStatement),
    Assign(AssignStatement),
    Read(ReadStatement),
    Write(WriteStatement),
}

impl Statement {
    pub fn line(&self) -> usize {
        match self {
            Statement::If(s) => s.line,
            Statement::Repeat(s) => s.line,
            Statement::Assign(s) => s.line,
            Statement::Read(s) => s.line,
            Statement::Write(s) => s.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Option<Vec<Statement>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatStatement {
    pub body: Vec<Statement>,
    pub condition: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    pub name: String,
    pub value: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadStatement {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteStatement {
    pub value: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary(BinaryExpression),
    Constant(ConstantExpression),
    Variable(VariableExpression),
    /// Stands in for a factor the parser could not read. Only ever present
    /// alongside a reported diagnostic.
    Error(usize),
}

impl Expression {
    pub fn line(&self) -> usize {
        match self {
            Expression::Binary(e) => e.line,
            Expression::Constant(e) => e.line,
            Expression::Variable(e) => e.line,
            Expression::Error(line) => *line,
        }
    }

    pub fn get_type(&self) -> Type {
        match self {
            Expression::Binary(e) => e._type,
            Expression::Constant(e) => e._type,
            Expression::Variable(e) => e._type,
            Expression::Error(_) => Type::Unresolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub kind: BinaryExpressionKind,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    pub line: usize,
    pub _type: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryExpressionKind {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Equal,
}

impl BinaryExpressionKind {
    pub fn is_comparison(&self) -> bool {
        matches!(self, BinaryExpressionKind::Less | BinaryExpressionKind::Equal)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryExpressionKind::Add => "+",
            BinaryExpressionKind::Sub => "-",
            BinaryExpressionKind::Mul => "*",
            BinaryExpressionKind::Div => "/",
            BinaryExpressionKind::Less => "<",
            BinaryExpressionKind::Equal => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpression {
    pub value: i32,
    pub line: usize,
    pub _type: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpression {
    pub name: String,
    pub line: usize,
    pub _type: Type,
}

// Tree dump used by the parse trace: two spaces of indent per level.

struct Indent(usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}", "", width = self.0 * 2)
    }
}

fn fmt_sequence(stmts: &[Statement], f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for stmt in stmts {
        fmt_statement(stmt, f, depth)?;
    }
    Ok(())
}

fn fmt_statement(stmt: &Statement, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    match stmt {
        Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            ..
        }) => {
            writeln!(f, "{}If", Indent(depth))?;
            fmt_expression(condition, f, depth + 1)?;
            fmt_sequence(then_branch, f, depth + 1)?;
            if let Some(else_branch) = else_branch {
                fmt_sequence(else_branch, f, depth + 1)?;
            }
        }
        Statement::Repeat(RepeatStatement { body, condition, .. }) => {
            writeln!(f, "{}Repeat", Indent(depth))?;
            fmt_sequence(body, f, depth + 1)?;
            fmt_expression(condition, f, depth + 1)?;
        }
        Statement::Assign(AssignStatement { name, value, .. }) => {
            writeln!(f, "{}Assign to: {}", Indent(depth), name)?;
            fmt_expression(value, f, depth + 1)?;
        }
        Statement::Read(ReadStatement { name, .. }) => {
            writeln!(f, "{}Read: {}", Indent(depth), name)?;
        }
        Statement::Write(WriteStatement { value, .. }) => {
            writeln!(f, "{}Write", Indent(depth))?;
            fmt_expression(value, f, depth + 1)?;
        }
    }
    Ok(())
}

fn fmt_expression(expr: &Expression, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    match expr {
        Expression::Binary(BinaryExpression { kind, lhs, rhs, .. }) => {
            writeln!(f, "{}Op: {}", Indent(depth), kind.symbol())?;
            fmt_expression(lhs, f, depth + 1)?;
            fmt_expression(rhs, f, depth + 1)?;
        }
        Expression::Constant(ConstantExpression { value, .. }) => {
            writeln!(f, "{}Const: {}", Indent(depth), value)?;
        }
        Expression::Variable(VariableExpression { name, .. }) => {
            writeln!(f, "{}Id: {}", Indent(depth), name)?;
        }
        Expression::Error(_) => {
            writeln!(f, "{}<error>", Indent(depth))?;
        }
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(&self.stmts, f, 0)
    }
}
