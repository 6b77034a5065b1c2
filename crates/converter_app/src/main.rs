//! `sql2oracle`: converts legacy SQL files into Oracle PL/SQL.
//!
//! A thin shim that maps CLI flags onto the platform layer and turns the
//! outcome into an exit status.

mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use converter_engine::BackendKind;
use log::LevelFilter;

use platform::logging::LogDestination;
use platform::{ConfigOverrides, ConvertRequest};

#[derive(Parser, Debug)]
#[command(
    name = "sql2oracle",
    version,
    about = "Convert SQL files to Oracle PL/SQL",
    long_about = "Select .sql/.txt files (or directories of them), send them to a \
                  conversion service and save the Oracle PL/SQL it returns."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: <config dir>/sql2oracle/config.ron)
    #[arg(long, global = true, env = "SQL2ORACLE_CONFIG")]
    config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value = "file")]
    log: LogDestination,

    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert files and show the results
    Convert(ConvertArgs),
    /// Sign in for subsequent conversions
    Login {
        /// User name to sign in as
        username: String,
    },
    /// Sign out of the current session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Files or directories to convert; directories contribute their .sql and .txt files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Conversion backend
    #[arg(long, value_enum, env = "SQL2ORACLE_BACKEND")]
    backend: Option<BackendArg>,

    /// Conversion service URL
    #[arg(long, env = "SQL2ORACLE_ENDPOINT")]
    endpoint: Option<String>,

    /// Directory downloads are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Save every result after a successful conversion
    #[arg(short, long)]
    download: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    /// Local placeholder output, no network
    Stub,
    /// HTTP conversion service
    Remote,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Stub => BackendKind::Stub,
            BackendArg::Remote => BackendKind::Remote,
        }
    }
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    platform::logging::initialize(cli.log, cli.level());

    let config = cli.config.as_deref();
    let result = match cli.command {
        Command::Convert(args) => platform::run_convert(
            config,
            ConvertRequest {
                paths: args.paths,
                overrides: ConfigOverrides {
                    backend: args.backend.map(BackendKind::from),
                    endpoint: args.endpoint,
                    output_dir: args.output_dir,
                },
                download: args.download,
            },
        ),
        Command::Login { username } => platform::run_login(config, &username),
        Command::Logout => platform::run_logout(config),
        Command::Whoami => platform::run_whoami(config),
    };

    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("\x1b[31m✗ Error:\x1b[0m {err:#}");
            ExitCode::from(1)
        }
    }
}
