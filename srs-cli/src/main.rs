use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use log::{error, LevelFilter};

mod commands;

use commands::CombineArgs;

#[derive(Parser, Debug)]
#[command(
    name = "srs",
    version = env!("CARGO_PKG_VERSION"),
    about = "Decode, combine and rectify RSTN SRS spectrograph files",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Тихий режим (только ошибки)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Подробный журнал (debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Сводка по каждому файлу (.srs или .srs.gz)
    Info {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Объединить файлы станций в одну спектрограмму
    Combine(CombineArgs),
    /// Список станций RSTN
    Sites,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let mut out = io::stdout().lock();

    let result = match &cli.command {
        Command::Info { files, json } => commands::info(files, *json, &mut out),
        Command::Combine(args) => commands::combine(args, &mut out),
        Command::Sites => commands::sites(&mut out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
