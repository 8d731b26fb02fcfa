use std::{env, fs::read_to_string, process::ExitCode, time::Instant};

use flowcheck::{
    display_diagnostic, display_error,
    evaluator::evaluator::check_with_options,
    lexer::lexer::tokenize,
    parser::parser::parse,
    CheckOptions,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// `FLOWCHECK_LOG` wins over `RUST_LOG`; without either, no subscriber is installed.
fn init_tracing() {
    let filter = match env::var("FLOWCHECK_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) if env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <file.js>", args.first().map(String::as_str).unwrap_or("flowcheck"));
        return ExitCode::from(2);
    }

    let file_path: &str = &args[1];
    let file_name = file_path.rsplit('/').next().unwrap_or(file_path);

    let source = match read_to_string(file_path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Failed to read {}: {}", file_path, error);
            return ExitCode::from(2);
        }
    };

    let start = Instant::now();

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(error) => {
            display_error(&error, &source, file_path);
            return ExitCode::FAILURE;
        }
    };
    debug!(elapsed = ?start.elapsed(), tokens = tokens.len(), "tokenized");

    let parse_start = Instant::now();
    let ast = match parse(tokens, file_name) {
        Ok(ast) => ast,
        Err(error) => {
            display_error(&error, &source, file_path);
            return ExitCode::FAILURE;
        }
    };
    debug!(elapsed = ?parse_start.elapsed(), nodes = ast.len(), "parsed");

    let check_start = Instant::now();
    let result = match check_with_options(&ast, &CheckOptions::default()) {
        Ok(result) => result,
        Err(error) => {
            display_error(&error, &source, file_path);
            return ExitCode::FAILURE;
        }
    };
    debug!(elapsed = ?check_start.elapsed(), total = ?start.elapsed(), "checked");

    for diagnostic in result.diagnostics() {
        display_diagnostic(diagnostic, &source, file_path);
    }

    if result.has_errors() {
        eprintln!("{} problem(s) found in {}", result.diagnostics().len(), file_name);
        return ExitCode::FAILURE;
    }

    println!("No problems found in {}", file_name);
    ExitCode::SUCCESS
}
