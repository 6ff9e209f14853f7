use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use worktrack::Config;

mod console;
mod datetime;
mod day_command;
mod range_command;

use console::{ConsoleJson, ConsoleMarkdownList, ConsolePresenter};
use day_command::{DayArgs, DayCommand};
use range_command::{RangeArgs, RangeCommand};

/// 勤務時間を入力式から記録するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- day "8-17/12-13"
/// $ cargo run -- day --date 2020-01-01 "8-10;11-15/12-13"
/// $ cargo run -- range --from 2020-01-06 --to 2020-01-10 --type vacation
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        short = 'v',
        long = "verbose",
        help = "Raises the log level (-v for info, -vv for debug)",
        parse(from_occurrences)
    )]
    verbose: u64,

    #[clap(long = "json", help = "Prints the result as json")]
    json: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Day(DayArgs),
    Range(RangeArgs),
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logger(args.verbose).context("Failed to setup logger")?;
    let config = Config::load().context("Failed to load config")?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    if args.json {
        run(args.subcommand, &config, &mut ConsoleJson::new(&mut writer))
    } else {
        run(args.subcommand, &config, &mut ConsoleMarkdownList::new(&mut writer))
    }
}

/// サブコマンドを実行する。
fn run<P: ConsolePresenter>(subcommand: SubCommands, config: &Config, presenter: &mut P) -> Result<()> {
    match subcommand {
        SubCommands::Day(day) => {
            DayCommand::new(config, presenter).run(day)?;
        }
        SubCommands::Range(range) => {
            RangeCommand::new(config, presenter).run(range)?;
        }
    }

    Ok(())
}

/// ログの出力先を標準エラー出力に設定する。
///
/// 既定ではwarn以上のみ出力し、`-v`の数に応じて詳細にする。
fn setup_logger(verbose: u64) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .debug(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("Failed to apply log dispatcher")?;

    Ok(())
}
