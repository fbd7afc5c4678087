use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use structopt::StructOpt;

use tinyc::machine::sim::Machine;
use tinyc::{compile, Stage, TraceOptions};

const STEP_LIMIT: usize = 10_000_000;

fn main() {
    let opts = Opt::from_args();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if opts.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    if let Err(e) = run(&opts) {
        eprintln!("tinyc: {:#}", e);
        std::process::exit(1);
    }
}

fn run(opts: &Opt) -> Result<()> {
    let source_path = if opts.path.extension().is_none() {
        opts.path.with_extension("tny")
    } else {
        opts.path.clone()
    };
    let code_path = opts
        .output
        .clone()
        .unwrap_or_else(|| source_path.with_extension("tm"));

    let source = File::open(&source_path)
        .with_context(|| format!("file {} not found", source_path.display()))?;

    let stdout = io::stdout();
    let mut listing = stdout.lock();
    writeln!(listing, "\nTINY COMPILATION: {}", source_path.display())?;

    let file_name = code_path.display().to_string();
    let compilation = compile(
        BufReader::new(source),
        &file_name,
        || Ok(Vec::<u8>::new()),
        &mut listing,
        opts.trace_options(),
    )?;

    for diagnostic in compilation.diagnostics.iter() {
        writeln!(listing, ">>> {}", diagnostic)?;
    }

    if !compilation.succeeded() {
        bail!("{} error(s), no code generated", compilation.diagnostics.len());
    }
    let code = match compilation.code {
        Some(code) => code,
        None => {
            tracing::info!(stage = ?opts.stop_after(), "stopped before code generation");
            return Ok(());
        }
    };
    std::fs::write(&code_path, code)
        .with_context(|| format!("cannot write {}", code_path.display()))?;
    tracing::info!(code = %code_path.display(), "wrote code file");

    if opts.run {
        drop(listing);
        simulate(&code_path)?;
    }

    Ok(())
}

fn simulate(code_path: &Path) -> Result<()> {
    let code = std::fs::read_to_string(code_path)?;
    let mut machine = Machine::load(&code)?;

    let mut raw_input = String::new();
    io::stdin().read_to_string(&mut raw_input)?;
    let input = raw_input
        .split_whitespace()
        .map(|word| word.parse::<i32>().with_context(|| format!("bad input value {:?}", word)))
        .collect::<Result<Vec<_>>>()?;

    for value in machine.run(input, STEP_LIMIT)? {
        println!("OUT instruction prints: {}", value);
    }
    Ok(())
}

#[derive(Debug, StructOpt)]
struct Opt {
    path: PathBuf,

    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// Stop after scanning.
    #[structopt(name = "lex", long)]
    lex: bool,

    /// Stop after parsing.
    #[structopt(name = "parse", long)]
    parse: bool,

    /// Stop after semantic analysis.
    #[structopt(name = "analyze", long)]
    analyze: bool,

    #[structopt(name = "echo-source", long)]
    echo_source: bool,

    #[structopt(name = "trace-scan", long)]
    trace_scan: bool,

    #[structopt(name = "trace-parse", long)]
    trace_parse: bool,

    #[structopt(name = "trace-analyze", long)]
    trace_analyze: bool,

    #[structopt(name = "trace-code", long)]
    trace_code: bool,

    #[structopt(name = "all-traces", long)]
    all_traces: bool,

    /// Execute the generated code, reading integers from stdin.
    #[structopt(long)]
    run: bool,

    #[structopt(short, long)]
    verbose: bool,
}

impl Opt {
    fn stop_after(&self) -> Stage {
        if self.lex {
            Stage::Scan
        } else if self.parse {
            Stage::Parse
        } else if self.analyze {
            Stage::Analyze
        } else {
            Stage::Code
        }
    }

    fn trace_options(&self) -> TraceOptions {
        if self.all_traces {
            return TraceOptions::all().stop_after(self.stop_after());
        }
        TraceOptions {
            echo_source: self.echo_source,
            trace_scan: self.trace_scan,
            trace_parse: self.trace_parse,
            trace_analyze: self.trace_analyze,
            trace_code: self.trace_code,
            stop_after: self.stop_after(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str, src: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tinyc-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prog.tny");
        std::fs::write(&path, src).unwrap();
        path
    }

    #[test]
    fn failed_compilation_leaves_no_code_file() {
        let path = scratch("fail", "if 1 then write 2 end");
        let opts = Opt::from_iter(vec!["tinyc", path.to_str().unwrap()]);
        assert!(run(&opts).is_err());
        assert!(!path.with_extension("tm").exists());
    }

    #[test]
    fn successful_compilation_writes_the_whole_listing() {
        let path = scratch("ok", "read x; write x * 2");
        let opts = Opt::from_iter(vec!["tinyc", path.to_str().unwrap()]);
        run(&opts).unwrap();
        let code = std::fs::read_to_string(path.with_extension("tm")).unwrap();
        let mut machine = Machine::load(&code).unwrap();
        assert_eq!(machine.run(vec![21], STEP_LIMIT).unwrap(), vec![42]);
    }

    #[test]
    fn stage_limited_run_writes_no_code_file() {
        let path = scratch("analyze", "read x; write x");
        let opts = Opt::from_iter(vec!["tinyc", "--analyze", path.to_str().unwrap()]);
        assert_eq!(opts.stop_after(), Stage::Analyze);
        run(&opts).unwrap();
        assert!(!path.with_extension("tm").exists());
    }
}
