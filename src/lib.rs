//! 勤務時間を短い入力式から記録するためのライブラリ。
//!
//! `8-17/12-13`や`7.5h`、`8-10;11-15/12-13`のような入力式を作業時間に変換し、
//! 休憩を除いた実働時間を集計する。勤怠登録用の時間帯との相互変換も扱う。

pub mod config;
pub mod models;
pub mod time_span;
pub mod work_hours;
pub mod work_time;
pub mod work_time_parser;

pub use config::Config;
pub use models::{FullDayType, Holiday, OffDutyReason, Project, WorkDay};
pub use time_span::{
    map_full_day_types, map_to_new_time_spans, map_to_work_days, ProjectTimeSpan,
    ProjectTimeSpans, TimeSpan, TimeSpanType,
};
pub use work_hours::{format_total, total_worked, work_hours_in_day, WorkedDuration};
pub use work_time::{format_work_times, WorkTime};
pub use work_time_parser::{parse_work_times, ParserConfig, WorkTimeParser};
