//! smart-lint CLI binary entry point.
//! Resolves settings, runs the pipeline, and prints the verdict to stderr.

use clap::Parser;
use owo_colors::OwoColorize;
use smart_lint::cli::{Cli, Commands};
use smart_lint::config::{self, Overrides};
use smart_lint::engine::{self, RunContext};
use smart_lint::{hook, lock, output};

const EXIT_FATAL: i32 = 1;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("SMART_LINT_LOG", default))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(cli: &Cli) -> smart_lint::Result<i32> {
    if cli.command() == Commands::Version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }
    let mut start_dir = cli.dir.clone();
    if start_dir.is_none() && cli.hook {
        start_dir = hook::read_stdin()?.directory_hint();
    }
    let settings = config::resolve_effective(&Overrides {
        start_dir,
        output: cli.output.clone(),
        debug: cli.debug,
        no_lock: cli.no_lock,
    })?;
    match &settings.config_path {
        Some(p) => log::debug!("config: {}", p.display()),
        None => log::debug!("no .smart-lint config found; using defaults"),
    }
    log::debug!("working tree root: {}", settings.root.display());

    let mode = settings.output;
    match cli.command() {
        Commands::Version => Ok(0),
        Commands::Tools => {
            let ctx = RunContext::new(settings)?;
            output::print_tools(&engine::list_tools(&ctx)?, mode);
            Ok(0)
        }
        Commands::Check => {
            let _guard = if settings.lock {
                Some(lock::acquire(&settings.root, settings.lock_timeout)?)
            } else {
                None
            };
            let tokens = output::context_tokens(&settings.root, &settings.context_files);
            let ctx = RunContext::new(settings)?;
            let verdict = engine::run(&ctx)?;
            output::print_verdict(&verdict, mode, tokens);
            Ok(verdict.exit_code())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if std::env::var_os("NO_COLOR").is_none() {
                eprintln!("{} {e}", "error:".red().bold());
            } else {
                eprintln!("error: {e}");
            }
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}
