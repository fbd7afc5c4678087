use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

pub const NO_REGS: usize = 8;

/// Accumulator.
pub const AC: usize = 0;
/// Second accumulator, holds the left operand of binary operations.
pub const AC1: usize = 1;
/// Base of the global data area.
pub const GP: usize = 5;
/// Top of memory; temporaries are stored at negative offsets from it.
pub const MP: usize = 6;
pub const PC: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Opcode {
    Halt,
    In,
    Out,
    Add,
    Sub,
    Mul,
    Div,
    Ld,
    St,
    Lda,
    Ldc,
    Jlt,
    Jle,
    Jgt,
    Jge,
    Jeq,
    Jne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// `op r,s,t`
    RegisterOnly,
    /// `op r,d(s)` with `d+reg[s]` used as a data address.
    RegisterMemory,
    /// `op r,d(s)` with `d+reg[s]` used as a value.
    RegisterAddress,
}

impl Opcode {
    pub fn class(&self) -> OpClass {
        match self {
            Opcode::Halt | Opcode::In | Opcode::Out | Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                OpClass::RegisterOnly
            }
            Opcode::Ld | Opcode::St => OpClass::RegisterMemory,
            _ => OpClass::RegisterAddress,
        }
    }
}

/// One TM word. For register-only opcodes the operands are `r,s,t`; for the
/// others `s` is the offset and `t` the base register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub r: i32,
    pub s: i32,
    pub t: i32,
}

impl Instruction {
    pub fn halt() -> Instruction {
        Instruction {
            op: Opcode::Halt,
            r: 0,
            s: 0,
            t: 0,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op.class() {
            OpClass::RegisterOnly => write!(f, "{:>5}  {},{},{}", self.op, self.r, self.s, self.t),
            _ => write!(f, "{:>5}  {},{}({})", self.op, self.r, self.s, self.t),
        }
    }
}

lazy_static! {
    static ref INSTRUCTION_RE: Regex = Regex::new(
        r"^\s*(?P<loc>\d+):\s*(?P<op>[A-Za-z]+)\s+(?P<r>-?\d+)\s*,\s*(?P<s>-?\d+)\s*(?:\(\s*(?P<base>-?\d+)\s*\)|,\s*(?P<t>-?\d+))"
    )
    .unwrap();
}

/// Reads an emitted listing into `(location, instruction)` pairs, in the
/// order the lines appear. Blank lines and `*` comment lines are skipped.
pub fn parse_listing(text: &str) -> Result<Vec<(usize, Instruction)>> {
    let mut instructions = vec![];

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            continue;
        }

        let Some(caps) = INSTRUCTION_RE.captures(line) else {
            bail!("line {}: malformed instruction: {:?}", index + 1, line);
        };

        let op = Opcode::from_str(&caps["op"].to_ascii_uppercase())
            .with_context(|| format!("line {}: unknown opcode {:?}", index + 1, &caps["op"]))?;
        let loc = caps["loc"].parse::<usize>()?;
        let r = caps["r"].parse::<i32>()?;
        let s = caps["s"].parse::<i32>()?;

        let t = match (op.class(), caps.name("t"), caps.name("base")) {
            (OpClass::RegisterOnly, Some(t), None) => t.as_str().parse::<i32>()?,
            (OpClass::RegisterMemory | OpClass::RegisterAddress, None, Some(base)) => {
                base.as_str().parse::<i32>()?
            }
            _ => bail!("line {}: wrong operand form for {}", index + 1, op),
        };

        instructions.push((loc, Instruction { op, r, s, t }));
    }

    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_operand_forms_and_skips_comments() {
        let listing = "* a comment\n  0:     LD  6,0(0) \tload maxaddress\n\n 12:    ADD  0,1,0 \n  3:    JEQ  0,-16(7) ";
        let parsed = parse_listing(listing).unwrap();
        assert_eq!(
            parsed,
            vec![
                (0, Instruction { op: Opcode::Ld, r: 6, s: 0, t: 0 }),
                (12, Instruction { op: Opcode::Add, r: 0, s: 1, t: 0 }),
                (3, Instruction { op: Opcode::Jeq, r: 0, s: -16, t: 7 }),
            ]
        );
    }

    #[test]
    fn rejects_mismatched_operand_form() {
        assert!(parse_listing("  0:    ADD  0,1(0)").is_err());
        assert!(parse_listing("  0:     LD  0,1,0").is_err());
        assert!(parse_listing("  0:    FOO  0,1,0").is_err());
    }

    #[test]
    fn opcodes_print_in_upper_case() {
        assert_eq!(Opcode::Ldc.to_string(), "LDC");
        assert_eq!(
            Instruction { op: Opcode::St, r: 0, s: -1, t: 6 }.to_string(),
            "   ST  0,-1(6)"
        );
    }
}
