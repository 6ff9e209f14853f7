use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use log::info;
use worktrack::{map_full_day_types, Config, FullDayType, OffDutyReason, TimeSpan};

use crate::console::ConsolePresenter;
use crate::day_command::parse_date;

/// `range`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct RangeArgs {
    #[clap(
        long = "from",
        help = "First day of the range in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    from: NaiveDate,

    #[clap(
        long = "to",
        help = "Last day of the range in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    to: NaiveDate,

    #[clap(
        long = "type",
        help = "One of vacation, sick or off-duty",
        parse(try_from_str)
    )]
    full_day_type: FullDayType,

    #[clap(long = "reason", help = "Reason for off-duty days", parse(try_from_str))]
    reason: Option<OffDutyReason>,
}

pub struct RangeCommand<'a, P: ConsolePresenter> {
    config: &'a Config,
    presenter: &'a mut P,
}

impl<'a, P: ConsolePresenter> RangeCommand<'a, P> {
    /// 新しい`RangeCommand`を返す。
    pub fn new(config: &'a Config, presenter: &'a mut P) -> Self {
        Self { config, presenter }
    }

    /// `range`サブコマンドの処理を行う。
    ///
    /// 期間内の平日に終日の時間帯を作成して表示する。土日と休日の祝日は除く。
    ///
    /// # Arguments
    ///
    /// * `args` - `range`サブコマンドの引数
    pub fn run(&mut self, args: RangeArgs) -> Result<Vec<TimeSpan>> {
        ensure!(
            args.from <= args.to,
            "Range must not end before it starts: {} - {}",
            args.from,
            args.to
        );
        info!("From: {}, To: {}", args.from, args.to);

        let time_spans = map_full_day_types(
            args.full_day_type,
            args.from,
            args.to,
            &self.config.holidays,
            args.reason,
        );
        info!("Created {} time spans", time_spans.len());

        self.presenter
            .show_time_spans(&time_spans, &[])
            .context("Failed to show time spans")?;

        Ok(time_spans)
    }
}
