use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use unwindify::ir::{EpilogueSymbol, PointerStyle, DEFAULT_EPILOGUE};
use unwindify::{rewrite, Outcome, RewriteOptions};

/// Wrong argument count or an unusable argument.
const EXIT_USAGE: u8 = 1;
/// The module already declares the epilogue routine.
const EXIT_ALREADY_PROCESSED: u8 = 2;

/// unwindify — force an LSDA for every function of an LLVM IR module.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    arg_required_else_help = true,
    long_about = "Modify <LLVM IR file> to force llc to generate an LSDA for each function, \
                  even those that statically cannot raise exceptions.\n\n\
                  With [epilogue function], notify the runtime of epilogue entry by invoking \
                  the named function."
)]
struct Cli {
    /// Textual LLVM IR module, rewritten in place
    #[arg(value_name = "LLVM IR file")]
    input: PathBuf,

    /// Routine invoked before every return
    #[arg(value_name = "epilogue function", default_value = DEFAULT_EPILOGUE)]
    epilogue: EpilogueSymbol,

    /// Write the rewritten module here instead of over the input
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Spell pointer types as `ptr` (LLVM 17 and later)
    #[arg(long)]
    opaque_pointers: bool,
}

impl Cli {
    fn options(&self) -> RewriteOptions {
        RewriteOptions {
            epilogue: self.epilogue.clone(),
            pointers: if self.opaque_pointers {
                PointerStyle::Opaque
            } else {
                PointerStyle::Typed
            },
        }
    }
}

enum Status {
    Rewritten,
    AlreadyProcessed,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("UNWINDIFY_LOG", "info")
            .write_style("UNWINDIFY_LOG_STYLE"),
    )
    .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    match run(&cli) {
        Ok(Status::Rewritten) => ExitCode::SUCCESS,
        Ok(Status::AlreadyProcessed) => ExitCode::from(EXIT_ALREADY_PROCESSED),
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Status> {
    let ll = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let options = cli.options();
    let (text, stats) = match rewrite(&ll, &options) {
        Outcome::Rewritten { text, stats } => (text, stats),
        Outcome::AlreadyProcessed => {
            eprintln!(
                "unwindify: {} already declares {}; leaving it unchanged",
                cli.input.display(),
                options.epilogue,
            );
            return Ok(Status::AlreadyProcessed);
        }
    };

    let output = cli.output.as_ref().unwrap_or(&cli.input);
    fs::write(output, text).with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "rewrote {} function(s) in {}: {} personality clause(s), {} return(s), {} landing pad(s)",
        stats.functions,
        output.display(),
        stats.personalities_attached,
        stats.returns_instrumented,
        stats.landing_pads_added,
    );
    Ok(Status::Rewritten)
}
