use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::ensure, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::InputArgs;
use crate::subcommands::{check, summary};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Build the pedigrees of an assertion log and report their errors and warnings
    Check {
        #[command(flatten)]
        args: InputArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,

        /// Fail if any pedigree has errors
        #[arg(long)]
        strict: bool,
    },

    /// Build the pedigrees of an assertion log and report their structure
    Summary {
        #[command(flatten)]
        args: InputArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,

        /// Include the names of unconnected members
        #[arg(long)]
        list_unconnected: bool,
    },
}

impl SubCommand {
    pub fn threads(&self) -> usize {
        match self {
            SubCommand::Check { threads, .. } | SubCommand::Summary { threads, .. } => *threads,
        }
    }

    #[rustfmt::skip]
    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Check { log_and_verbosity, .. }
            | SubCommand::Summary { log_and_verbosity, .. }
            => (log_and_verbosity.verbosity, &log_and_verbosity.log_file, log_and_verbosity.silent),
        }
    }

    pub fn check_threads(&self) -> Result<()> {
        ensure!(self.threads() >= 1, "Thread count needs to be atleast one");
        Ok(())
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    args.cmd.check_threads()?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.cmd.threads())
        .build_global()?;

    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Check { args, strict, .. } => check::run(args, strict)?,
        SubCommand::Summary { args, list_unconnected, .. } => summary::run(args, list_unconnected)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 | 1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, _guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, _guard))
}

pub fn get_styles() -> clap::builder::Styles {
    let yellow = Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow));
    let green = Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green));
    let red = Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red));

    clap::builder::Styles::styled()
        .usage(anstyle::Style::new().bold().underline().fg_color(yellow))
        .header(anstyle::Style::new().bold().underline().fg_color(yellow))
        .literal(anstyle::Style::new().fg_color(green))
        .invalid(anstyle::Style::new().bold().fg_color(red))
        .error(anstyle::Style::new().bold().fg_color(red))
        .valid(anstyle::Style::new().bold().underline().fg_color(green))
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> LogAndVerbosity {
        LogAndVerbosity {
            verbosity: 0,
            log_file: None,
            silent: false,
        }
    }

    #[test]
    fn test_init_tracing() {
        let (level, _, _) = init_tracing(1, &None, false).unwrap();
        assert_eq!(Level::ERROR, level);
        let (level, _, _) = init_tracing(2, &None, false).unwrap();
        assert_eq!(Level::WARN, level);
        let (level, _, _) = init_tracing(3, &None, false).unwrap();
        assert_eq!(Level::INFO, level);
        let (level, _, _) = init_tracing(4, &None, false).unwrap();
        assert_eq!(Level::DEBUG, level);
        let (level, _, _) = init_tracing(5, &None, false).unwrap();
        assert_eq!(Level::TRACE, level);
        let (level, _, _) = init_tracing(5, &None, true).unwrap();
        assert_eq!(Level::ERROR, level);
    }

    #[test]
    fn test_threads() {
        let subcommand = SubCommand::Check {
            args: InputArgs::default(),
            log_and_verbosity: quiet(),
            threads: 4,
            strict: false,
        };
        assert_eq!(4, subcommand.threads());
        assert!(subcommand.check_threads().is_ok());

        let subcommand = SubCommand::Summary {
            args: InputArgs::default(),
            log_and_verbosity: quiet(),
            threads: 0,
            list_unconnected: false,
        };
        assert!(subcommand.check_threads().is_err());
    }

    #[test]
    fn test_parse_arguments() {
        let args = Arguments::parse_from(["pedtk", "check", "log.csv", "--strict", "-t", "2"]);
        match args.cmd {
            SubCommand::Check {
                args,
                strict,
                threads,
                ..
            } => {
                assert_eq!(args.file, PathBuf::from("log.csv"));
                assert!(strict);
                assert_eq!(threads, 2);
            }
            SubCommand::Summary { .. } => panic!("parsed the wrong subcommand"),
        }
    }
}
