use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::info;
use worktrack::{map_to_new_time_spans, Config, OffDutyReason, WorkDay, WorkTimeParser};

use crate::console::ConsolePresenter;
use crate::datetime;

/// 1日分の勤務記録を入力式から作成するためのサブコマンド。
#[derive(Debug, Default, clap::Args)]
pub struct DayArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(short = 'p', long = "project", help = "Assigns the work times to a project id")]
    project: Option<i64>,

    #[clap(long = "homeoffice", help = "Marks the day as home office")]
    homeoffice: bool,

    #[clap(long = "sick", help = "Marks the rest of the day as sick leave")]
    sick_leave: bool,

    #[clap(long = "vacation", help = "Marks the whole day as vacation")]
    vacation: bool,

    #[clap(
        long = "off-duty",
        help = "Marks the whole day as off duty with a reason",
        parse(try_from_str)
    )]
    off_duty: Option<OffDutyReason>,

    #[clap(long = "time-spans", help = "Also shows the time spans for booking")]
    time_spans: bool,

    #[clap(help = "Work times such as \"8-17/12-13\", \"7.5h\" or \"8-10;11-15/12-13\"")]
    expression: Option<String>,
}

pub struct DayCommand<'a, P: ConsolePresenter> {
    config: &'a Config,
    presenter: &'a mut P,
}

impl<'a, P: ConsolePresenter> DayCommand<'a, P> {
    /// 新しい`DayCommand`を返す。
    ///
    /// # Arguments
    /// * `config` - パーサーの既定値、祝日、プロジェクトの設定
    /// * `presenter` - 結果を表示する先
    pub fn new(config: &'a Config, presenter: &'a mut P) -> Self {
        Self { config, presenter }
    }

    /// `day`サブコマンドの処理を行う。
    ///
    /// 入力式を指定された日付の勤務記録に変換し、表示する。
    /// 日付が指定されていない場合は、Localタイムゾーンで今日の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `day`サブコマンドの引数
    pub fn run(&mut self, args: DayArgs) -> Result<WorkDay> {
        let date = args.date.unwrap_or_else(datetime::today);
        info!("Date: {}", date);

        if let Some(id) = args.project {
            if !self.config.projects.is_empty() && self.config.active_project(id, date).is_none() {
                bail!("Project {} is not active on {}", id, date);
            }
        }

        let expression = args.expression.unwrap_or_default();
        let parser = WorkTimeParser::new(self.config.parser.clone());
        let mut day = parser.parse_day(date, &expression);
        day.work_times = day
            .work_times
            .into_iter()
            .map(|work_time| work_time.with_project(args.project))
            .collect();
        day.homeoffice = args.homeoffice;
        day.sick_leave = args.sick_leave;
        day.vacation = args.vacation || args.off_duty.is_some();
        day.off_duty = args.off_duty;
        info!("Parsed {} work times from {:?}", day.work_times.len(), expression);

        if day.is_empty() {
            bail!("No valid work time in expression: {:?}", expression);
        }

        self.presenter
            .show_work_day(&day)
            .context("Failed to show work day")?;

        if args.time_spans {
            let (time_spans, project_times) = map_to_new_time_spans(&day, &self.config.holidays);
            self.presenter
                .show_time_spans(&time_spans, &project_times)
                .context("Failed to show time spans")?;
        }

        Ok(day)
    }
}

/// 日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}
