//! mockexec CLI: `RUSTC_WRAPPER` entry point plus inspection commands.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mockexec::discovery::discover;
use mockexec::transform::FunctionPolicy;
use mockexec::{logging, CompileInvocation, Config, Error, Interceptor, TransformOptions};

#[derive(Parser)]
#[command(name = "mockexec")]
#[command(version, about = "Compile-time function interception for Rust", long_about = None)]
#[command(after_help = "Use as a cargo wrapper: RUSTC_WRAPPER=mockexec MOCKEXEC_TARGETS=src/lib.rs cargo test")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the instrumented form of a source file
    Expand {
        file: PathBuf,

        /// Function to instrument (repeatable); default is every eligible function
        #[arg(short = 'f', long = "function", value_name = "NAME")]
        functions: Vec<String>,

        /// Function to leave alone when no --function is given [default: main]
        #[arg(long = "exclude", value_name = "NAME")]
        exclude: Vec<String>,
    },

    /// Report, as JSON, what would be instrumented under a directory
    Scan { dir: PathBuf },

    /// `mockexec <tool> [args...]`: run the real tool, instrumenting target files
    #[command(external_subcommand)]
    Exec(Vec<OsString>),
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error[{}]: {}", err.code(), err);
            err.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(command: Commands) -> Result<i32, Error> {
    match command {
        Commands::Exec(args) => {
            let invocation = CompileInvocation::from_args(args)?;
            Interceptor::from_env()?.run(&invocation)
        }
        Commands::Expand {
            file,
            functions,
            exclude,
        } => {
            let policy = if !functions.is_empty() {
                FunctionPolicy::Named { names: functions }
            } else if !exclude.is_empty() {
                FunctionPolicy::All { exclude }
            } else {
                FunctionPolicy::default()
            };
            let options = TransformOptions {
                policy,
                ..Config::from_env()?.transform_options()
            };

            let output = mockexec::transform_file(&file, &options)?;
            for skipped in &output.skipped {
                eprintln!("skipped `{}`: {}", skipped.name, skipped.reason);
            }
            print!("{}", output.source);
            Ok(0)
        }
        Commands::Scan { dir } => {
            let options = Config::from_env()?.transform_options();
            let reports = discover(&dir, &options);
            let json = serde_json::to_string_pretty(&reports).map_err(|err| Error::Emit {
                file: dir.display().to_string(),
                message: err.to_string(),
            })?;
            println!("{json}");
            Ok(if reports.iter().any(|report| report.error.is_some()) {
                1
            } else {
                0
            })
        }
    }
}
