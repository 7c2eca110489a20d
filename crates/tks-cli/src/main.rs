use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tks_eval::{Bindings, EvalConfig, Session};

#[derive(Parser)]
#[command(name = "tks")]
#[command(about = "TkSystem property expression evaluator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Deepest allowed nesting of function calls
    #[arg(long, global = true, default_value_t = 1000)]
    max_depth: usize,

    /// Disable the call depth limit
    #[arg(long, global = true)]
    no_depth_limit: bool,

    /// Source name shown in error reports
    #[arg(long, global = true, default_value = "<TkSystem>")]
    name: String,

    /// Log more (-v debug, -vv trace); RUST_LOG is used otherwise
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one expression and print the result
    Eval {
        /// Expression source
        expr: String,
    },

    /// Evaluate every line of a file in one session
    Run {
        /// Input file, one expression per line
        path: String,
    },

    /// Read expressions from stdin until EOF
    Repl,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = EvalConfig::default()
        .with_max_call_depth((!cli.no_depth_limit).then_some(cli.max_depth));
    let session = Session::with_config(config);

    let ok = match &cli.command {
        Command::Eval { expr } => cmd_eval(&session, &cli.name, expr),
        Command::Run { path } => cmd_run(&session, path),
        Command::Repl => cmd_repl(&session, &cli.name),
    };
    if !ok {
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        0 => return,
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true).with_writer(io::stderr))
        .with(filter)
        .init();
}

fn cmd_eval(session: &Session, name: &str, expr: &str) -> bool {
    match session.evaluate(name, expr, &Bindings::new()) {
        Ok(value) => {
            println!("{value}");
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(session: &Session, path: &str) -> bool {
    let source = read_source(path);
    let mut failed = 0;

    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match session.evaluate(path, line, &Bindings::new()) {
            Ok(value) => println!("{value}"),
            Err(e) => {
                eprintln!("{}\n", e.render(Some(index + 1)));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} line(s) failed: {path}");
    }
    failed == 0
}

fn cmd_repl(session: &Session, name: &str) -> bool {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!(">>> ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading stdin: {e}");
                return false;
            }
            None => {
                println!();
                return true;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match session.evaluate(name, &line, &Bindings::new()) {
            Ok(value) => println!("{value}"),
            Err(e) => eprintln!("{e}"),
        }
    }
}
