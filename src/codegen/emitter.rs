use crate::{
    error::{CompileError, CompileResult},
    machine::isa::{Opcode, PC},
};
use std::{collections::BTreeSet, io::Write};

/// Writes TM instructions straight to `out`, one line each, tagged with
/// the location they occupy. Backpatched lines are written when patched, so
/// the text is not in location order.
pub struct Emitter<W> {
    out: W,
    loc: usize,
    high_loc: usize,
    reserved: BTreeSet<usize>,
    trace_code: bool,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W, trace_code: bool) -> Emitter<W> {
        Emitter {
            out,
            loc: 0,
            high_loc: 0,
            reserved: BTreeSet::new(),
            trace_code,
        }
    }

    pub fn location(&self) -> usize {
        self.loc
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_loc
    }

    pub fn emit_comment(&mut self, comment: &str) -> CompileResult<()> {
        if self.trace_code {
            writeln!(self.out, "* {}", comment)?;
        }
        Ok(())
    }

    fn finish_line(&mut self, comment: &str) -> CompileResult<()> {
        if self.trace_code {
            write!(self.out, "\t{}", comment)?;
        }
        writeln!(self.out)?;
        self.reserved.remove(&self.loc);
        self.loc += 1;
        self.high_loc = self.high_loc.max(self.loc);
        Ok(())
    }

    /// `op r,s,t`
    pub fn emit_ro(&mut self, op: Opcode, r: usize, s: usize, t: usize, comment: &str) -> CompileResult<()> {
        write!(self.out, "{:3}:  {:>5}  {},{},{} ", self.loc, op, r, s, t)?;
        self.finish_line(comment)
    }

    /// `op r,d(s)`
    pub fn emit_rm(&mut self, op: Opcode, r: usize, d: i32, s: usize, comment: &str) -> CompileResult<()> {
        write!(self.out, "{:3}:  {:>5}  {},{}({}) ", self.loc, op, r, d, s)?;
        self.finish_line(comment)
    }

    /// Emits `op r,d(pc)` with `d` chosen so the instruction reaches `target`.
    /// The pc has already moved past this instruction when it executes.
    pub fn emit_rm_abs(&mut self, op: Opcode, r: usize, target: usize, comment: &str) -> CompileResult<()> {
        let offset = target as i64 - (self.loc as i64 + 1);
        let offset = i32::try_from(offset)
            .map_err(|_| CompileError::Backpatch(format!("branch to {} is out of range", target)))?;
        self.emit_rm(op, r, offset, PC, comment)
    }

    /// Skips `n` locations to be filled in later, returning the first one.
    pub fn reserve(&mut self, n: usize) -> usize {
        let start = self.loc;
        self.reserved.extend(start..start + n);
        self.loc += n;
        self.high_loc = self.high_loc.max(self.loc);
        start
    }

    /// Moves the cursor back to a reserved location.
    pub fn patch(&mut self, loc: usize) -> CompileResult<()> {
        if loc > self.high_loc || !self.reserved.contains(&loc) {
            return Err(CompileError::Backpatch(format!(
                "location {} was not reserved or is already filled",
                loc
            )));
        }
        self.loc = loc;
        Ok(())
    }

    /// Moves the cursor to the first location never emitted or reserved.
    pub fn restore(&mut self) {
        self.loc = self.high_loc;
    }

    /// Checks every reserved slot was filled and hands back the writer.
    pub fn finish(mut self) -> CompileResult<W> {
        if let Some(loc) = self.reserved.iter().next() {
            return Err(CompileError::Backpatch(format!(
                "reserved location {} was never patched",
                loc
            )));
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
