use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Parser;
use tapeopt::brainfuck::{Inst, OptLevel, compile, dump, emit_c_file, run};
use tapeopt::stream::{Tee, read_source};
use tapeopt::{DEFAULT_SOURCE_LIMIT, DEFAULT_TAPE_LEN, Result};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tapeopt")]
#[command(about = "An optimizing brainfuck interpreter and C translator")]
struct Args {
    /// Path to the Brainfuck program file to execute
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Optimization level
    #[arg(short = 'O', long = "opt", value_enum, default_value_t = OptLevel::O2)]
    opt: OptLevel,

    /// Number of cells in the memory tape
    #[arg(short, long, default_value_t = DEFAULT_TAPE_LEN)]
    length: usize,

    /// Flush stdout after each . instruction
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    flush: bool,

    /// Write equivalent C source to this path instead of interpreting
    #[arg(long, value_name = "OUT")]
    emit_c: Option<PathBuf>,

    /// Also copy program output into this file
    #[arg(long, value_name = "PATH")]
    tee: Option<PathBuf>,

    /// Print the finished instruction sequence to stderr
    #[arg(long, action = clap::ArgAction::SetTrue)]
    dump_ir: bool,

    /// Largest accepted source file, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_SOURCE_LIMIT)]
    max_source: u64,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    if let Err(e) = execute(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn execute(args: &Args) -> Result<()> {
    let code = read_source(&args.file, args.max_source)?;
    let prog = compile(&code, args.opt)?;
    info!(file = %args.file.display(), level = %args.opt, insts = prog.len(), "compiled");
    if args.dump_ir {
        print_ir(&prog);
    }

    if let Some(out) = &args.emit_c {
        return emit_c_file(&prog, args.length, out);
    }

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    match &args.tee {
        Some(path) => {
            let mirror = BufWriter::new(File::create(path)?);
            interpret(args.flush, &prog, args.length, stdin, Tee::new(stdout, mirror))
        }
        None => interpret(args.flush, &prog, args.length, stdin, stdout),
    }
}

fn interpret<R: io::Read, W: io::Write>(
    flush: bool,
    prog: &[Inst],
    length: usize,
    input: R,
    output: W,
) -> Result<()> {
    if flush {
        run::<true, _, _>(prog, length, input, output)
    } else {
        run::<false, _, _>(prog, length, input, output)
    }
}

fn print_ir(prog: &[Inst]) {
    let mut text = String::new();
    if dump(prog, &mut text).is_ok() {
        eprint!("{text}");
    }
}
