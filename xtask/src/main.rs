use anyhow::Result as AnyResult;
use clap::{Parser, Subcommand, ValueEnum};

use duct::{cmd, Expression};

/// Bare-metal target used to make sure the driver builds without `std`.
const EMBEDDED_TARGET: &str = "thumbv7em-none-eabihf";

#[derive(Debug, Subcommand)]
pub enum Subcommands {
    /// Runs tests.
    Test {
        /// Which logging backend to enable.
        logging: Option<Logging>,
    },

    /// Checks the driver for errors on an embedded target.
    Check {
        /// Which logging backend to enable.
        logging: Option<Logging>,
    },

    /// Builds the documentation.
    Doc {
        /// Whether to open the documentation in a browser.
        #[clap(long)]
        open: bool,
    },

    /// Runs extra checks (rustfmt, clippy with every logging backend).
    ExtraCheck,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Logging {
    #[default]
    None,
    Log,
    Defmt,
}

impl Logging {
    const ALL: [Logging; 3] = [Logging::None, Logging::Log, Logging::Defmt];

    fn features(&self) -> Option<&'static str> {
        match self {
            Logging::None => None,
            Logging::Log => Some("--features=log"),
            Logging::Defmt => Some("--features=defmt"),
        }
    }
}

#[derive(Debug, Parser)]
#[clap(about, version, propagate_version = true)]
pub struct Cli {
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

fn cargo(args: &[&str]) -> Expression {
    println!("🛠️  Running command: cargo {}", args.join(" "));

    cmd("cargo", args.to_vec())
}

fn with_logging(mut args: Vec<&str>, logging: Logging) -> Vec<&str> {
    if let Some(features) = logging.features() {
        args.push(features);
    }
    args
}

fn test(logging: Logging) -> AnyResult<()> {
    // defmt needs a global logger that host tests don't link
    if logging == Logging::Defmt {
        anyhow::bail!("defmt logging can only be checked, not tested on the host");
    }

    let args = with_logging(vec!["test", "-p", "max1704x"], logging);

    cargo(&args).run()?;

    Ok(())
}

fn checks(logging: Logging) -> AnyResult<()> {
    let target = format!("--target={EMBEDDED_TARGET}");
    let args = with_logging(vec!["check", "-p", "max1704x", &target], logging);

    cargo(&args).run()?;

    Ok(())
}

fn docs(open: bool) -> AnyResult<()> {
    let mut args = vec!["doc", "-p", "max1704x", "--no-deps"];

    if open {
        args.push("--open");
    }

    cargo(&args).run()?;

    Ok(())
}

fn extra_checks() -> AnyResult<()> {
    cargo(&["fmt", "--all", "--check"]).run()?;

    for logging in Logging::ALL {
        let args = with_logging(vec!["clippy", "-p", "max1704x", "--all-targets"], logging);
        cargo(&args).run()?;
    }

    Ok(())
}

fn main() -> AnyResult<()> {
    let cli = Cli::parse();

    match cli.subcommand {
        Subcommands::Test { logging } => test(logging.unwrap_or_default()),
        Subcommands::Check { logging } => checks(logging.unwrap_or_default()),
        Subcommands::Doc { open } => docs(open),
        Subcommands::ExtraCheck => extra_checks(),
    }
}
