use crate::{
    error::{CompileError, CompileResult},
    parser::ast::{AssignStatement, Expression, Program, ReadStatement, Statement, VariableExpression},
    semantics::visit::{walk_program, Visitor},
};
use std::{collections::HashMap, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub location: usize,
    pub lines: Vec<usize>,
}

/// Identifier name to global data location. Locations are handed out in
/// order of first occurrence; every occurrence records its line.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    next_location: usize,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Builds the table with a pre-order walk over `program`.
    pub fn build(program: &mut Program) -> CompileResult<SymbolTable> {
        let mut builder = SymbolTableBuilder {
            table: SymbolTable::new(),
        };
        walk_program(program, &mut builder)?;
        tracing::debug!(symbols = builder.table.len(), "built symbol table");
        Ok(builder.table)
    }

    pub fn insert(&mut self, name: &str, line: usize) -> CompileResult<()> {
        match self.symbols.get_mut(name) {
            Some(symbol) => {
                symbol
                    .lines
                    .try_reserve(1)
                    .map_err(|_| CompileError::OutOfMemory("symbol table"))?;
                symbol.lines.push(line);
            }
            None => {
                self.symbols
                    .try_reserve(1)
                    .map_err(|_| CompileError::OutOfMemory("symbol table"))?;
                self.symbols.insert(
                    name.to_owned(),
                    Symbol {
                        location: self.next_location,
                        lines: vec![line],
                    },
                );
                self.next_location += 1;
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.symbols.get(name).map(|symbol| symbol.location)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn by_location(&self) -> Vec<(&str, &Symbol)> {
        let mut entries = self
            .symbols
            .iter()
            .map(|(name, symbol)| (name.as_str(), symbol))
            .collect::<Vec<_>>();
        entries.sort_by_key(|(_, symbol)| symbol.location);
        entries
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variable Name  Location   Line Numbers")?;
        writeln!(f, "-------------  --------   ------------")?;
        for (name, symbol) in self.by_location() {
            write!(f, "{:<14} {:<8}  ", name, symbol.location)?;
            for line in &symbol.lines {
                write!(f, "{:4} ", line)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct SymbolTableBuilder {
    table: SymbolTable,
}

impl Visitor for SymbolTableBuilder {
    fn pre_statement(&mut self, stmt: &mut Statement) -> CompileResult<()> {
        match stmt {
            Statement::Assign(AssignStatement { name, line, .. })
            | Statement::Read(ReadStatement { name, line }) => self.table.insert(name, *line),
            _ => Ok(()),
        }
    }

    fn pre_expression(&mut self, expr: &mut Expression) -> CompileResult<()> {
        match expr {
            Expression::Variable(VariableExpression { name, line, .. }) => {
                self.table.insert(name, *line)
            }
            _ => Ok(()),
        }
    }
}
