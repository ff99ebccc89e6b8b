// sprig - A small embeddable Lisp interpreter
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::thread;

use sprig_embed::{EVAL_STACK_SIZE, Engine, Error, ErrorKind, RunMode};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if matches!(args.as_slice(), [flag] if flag == "--version" || flag == "-v") {
        println!("Sprig v{VERSION}");
        return;
    }

    // Evaluation extends its stack as it goes; this is only the first segment.
    let runner = thread::Builder::new()
        .name("sprig-main".to_string())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || if args.is_empty() { run_repl() } else { run_files(&args) });

    let code = match runner.map(thread::JoinHandle::join) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => 101,
        Err(e) => {
            eprintln!("Error: cannot start evaluator thread: {e}");
            1
        }
    };
    process::exit(code);
}

fn report(err: &Error) {
    eprintln!("{err}");
    let trace = err.stack_trace();
    if !trace.is_empty() {
        eprint!("{trace}");
    }
}

/// Evaluate each file in order, stopping at the first failure.
fn run_files(files: &[String]) -> i32 {
    let engine = match Engine::builder().run_mode(RunMode::Script).build() {
        Ok(engine) => engine,
        Err(e) => {
            report(&e);
            return 1;
        }
    };
    for file in files {
        let path = Path::new(file);
        if path.extension().and_then(|e| e.to_str()) != Some("sprig") {
            eprintln!("Error: '{file}' is not a .sprig file");
            return 1;
        }
        tracing::debug!(file = %file, "running file");
        if let Err(e) = engine.eval_file(path) {
            report(&e);
            return 1;
        }
    }
    0
}

/// Run the interactive REPL. Input is collected until it reads as complete
/// forms, so definitions may span several lines.
fn run_repl() -> i32 {
    let engine = match Engine::builder().run_mode(RunMode::Repl).build() {
        Ok(engine) => engine,
        Err(e) => {
            report(&e);
            return 1;
        }
    };
    println!("Sprig v{VERSION}");

    let stdin = io::stdin();
    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() {
            format!("{}=> ", engine.namespace())
        } else {
            "... ".to_string()
        };
        print!("{prompt}");
        if io::stdout().flush().is_err() {
            return 1;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return 0;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {e}");
                return 1;
            }
        }
        pending.push_str(&line);
        if pending.trim().is_empty() {
            pending.clear();
            continue;
        }

        match engine.eval_source(&pending, "<repl>") {
            Ok(value) => println!("{}", sprig_embed::print(&value)),
            Err(e) if matches!(e.kind(), ErrorKind::Read(r) if r.is_eof()) => continue,
            Err(e) => report(&e),
        }
        pending.clear();
    }
}
