use crate::machine::isa::{parse_listing, Instruction, Opcode, NO_REGS, PC};
use anyhow::{bail, Result};

pub const IADDR_SIZE: usize = 1024;
pub const DADDR_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Halted,
}

/// Interpreter for TM code.
pub struct Machine {
    imem: Vec<Instruction>,
    dmem: Vec<i32>,
    reg: [i32; NO_REGS],
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl Machine {
    pub fn new() -> Machine {
        let mut dmem = vec![0; DADDR_SIZE];
        dmem[0] = DADDR_SIZE as i32 - 1;
        Machine {
            imem: vec![Instruction::halt(); IADDR_SIZE],
            dmem,
            reg: [0; NO_REGS],
        }
    }

    pub fn load(listing: &str) -> Result<Machine> {
        let mut machine = Machine::new();
        for (loc, instruction) in parse_listing(listing)? {
            if loc >= IADDR_SIZE {
                bail!("location {} is outside instruction memory", loc);
            }
            machine.imem[loc] = instruction;
        }
        Ok(machine)
    }

    pub fn register(&self, r: usize) -> i32 {
        self.reg[r]
    }

    pub fn data(&self, addr: usize) -> Option<i32> {
        self.dmem.get(addr).copied()
    }

    fn reg_index(r: i32) -> Result<usize> {
        match usize::try_from(r) {
            Ok(r) if r < NO_REGS => Ok(r),
            _ => bail!("register {} does not exist", r),
        }
    }

    fn data_index(addr: i32) -> Result<usize> {
        match usize::try_from(addr) {
            Ok(addr) if addr < DADDR_SIZE => Ok(addr),
            _ => bail!("data memory access out of range: {}", addr),
        }
    }

    pub fn step(&mut self, input: &mut dyn Iterator<Item = i32>, output: &mut Vec<i32>) -> Result<StepResult> {
        let pc = self.reg[PC];
        let Some(instruction) = usize::try_from(pc).ok().and_then(|pc| self.imem.get(pc)).copied() else {
            bail!("instruction memory access out of range: {}", pc);
        };
        self.reg[PC] = pc.wrapping_add(1);

        let Instruction { op, r, s, t } = instruction;
        let r = Machine::reg_index(r)?;

        match op {
            Opcode::Halt => return Ok(StepResult::Halted),
            Opcode::In => match input.next() {
                Some(value) => self.reg[r] = value,
                None => bail!("input exhausted at location {}", pc),
            },
            Opcode::Out => output.push(self.reg[r]),
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let lhs = self.reg[Machine::reg_index(s)?];
                let rhs = self.reg[Machine::reg_index(t)?];
                self.reg[r] = match op {
                    Opcode::Add => lhs.wrapping_add(rhs),
                    Opcode::Sub => lhs.wrapping_sub(rhs),
                    Opcode::Mul => lhs.wrapping_mul(rhs),
                    _ => {
                        if rhs == 0 {
                            bail!("division by zero at location {}", pc);
                        }
                        lhs.wrapping_div(rhs)
                    }
                };
            }
            _ => {
                let m = s.wrapping_add(self.reg[Machine::reg_index(t)?]);
                match op {
                    Opcode::Ld => self.reg[r] = self.dmem[Machine::data_index(m)?],
                    Opcode::St => {
                        let addr = Machine::data_index(m)?;
                        self.dmem[addr] = self.reg[r];
                    }
                    Opcode::Lda => self.reg[r] = m,
                    Opcode::Ldc => self.reg[r] = s,
                    _ => {
                        let value = self.reg[r];
                        let taken = match op {
                            Opcode::Jlt => value < 0,
                            Opcode::Jle => value <= 0,
                            Opcode::Jgt => value > 0,
                            Opcode::Jge => value >= 0,
                            Opcode::Jeq => value == 0,
                            _ => value != 0,
                        };
                        if taken {
                            self.reg[PC] = m;
                        }
                    }
                }
            }
        }

        Ok(StepResult::Continue)
    }

    /// Runs until `HALT`, returning everything written by `OUT`.
    pub fn run(&mut self, input: impl IntoIterator<Item = i32>, step_limit: usize) -> Result<Vec<i32>> {
        let mut input = input.into_iter();
        let mut output = vec![];
        for _ in 0..step_limit {
            if self.step(&mut input, &mut output)? == StepResult::Halted {
                return Ok(output);
            }
        }
        bail!("step limit of {} exceeded", step_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_constants_and_writes_them() {
        let mut machine = Machine::load("  0:    LDC  0,42(0)\n  1:    OUT  0,0,0\n  2:   HALT  0,0,0").unwrap();
        assert_eq!(machine.run([], 100).unwrap(), vec![42]);
    }

    #[test]
    fn data_memory_starts_with_its_top_address() {
        let mut machine = Machine::load("  0:     LD  6,0(0)\n  1:   HALT  0,0,0").unwrap();
        machine.run([], 10).unwrap();
        assert_eq!(machine.register(6), DADDR_SIZE as i32 - 1);
    }

    #[test]
    fn relative_jump_skips_instructions() {
        let listing = "  0:    LDC  0,0(0)\n  1:    JEQ  0,1(7)\n  2:    OUT  0,0,0\n  3:     IN  1,0,0\n  4:    OUT  1,0,0";
        let mut machine = Machine::load(listing).unwrap();
        assert_eq!(machine.run([7], 100).unwrap(), vec![7]);
    }

    #[test]
    fn division_by_zero_fails() {
        let mut machine = Machine::load("  0:    DIV  0,0,1").unwrap();
        assert!(machine.run([], 10).is_err());
    }

    #[test]
    fn missing_input_fails() {
        let mut machine = Machine::load("  0:     IN  0,0,0").unwrap();
        assert!(machine.run([], 10).is_err());
    }

    #[test]
    fn endless_loop_hits_step_limit() {
        let mut machine = Machine::load("  0:    LDA  7,-1(7)").unwrap();
        assert!(machine.run([], 50).is_err());
    }
}
