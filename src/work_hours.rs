use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::models::WorkDay;
use crate::work_time::WorkTime;

/// 休憩を除いた実働時間。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkedDuration {
    total_minutes: i64,
}

impl WorkedDuration {
    pub fn from_minutes(total_minutes: i64) -> Self {
        Self { total_minutes }
    }

    pub fn total_minutes(&self) -> i64 {
        self.total_minutes
    }

    pub fn hours(&self) -> i64 {
        self.total_minutes / 60
    }

    /// 時間に満たない残りの分。
    pub fn minutes(&self) -> i64 {
        self.total_minutes % 60
    }

    pub fn is_zero(&self) -> bool {
        self.total_minutes == 0
    }
}

impl Add for WorkedDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_minutes(self.total_minutes + rhs.total_minutes)
    }
}

impl Sum for WorkedDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// `HH:MM`形式で表示する。24時間を超える場合は時間の桁が増える。
impl fmt::Display for WorkedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

/// 作業時間の合計から休憩時間の合計を引いた実働時間を返す。
///
/// # Arguments
///
/// * `work_times` - 1日分の作業時間
pub fn total_worked(work_times: &[WorkTime]) -> WorkedDuration {
    work_times
        .iter()
        .map(|work_time| {
            WorkedDuration::from_minutes(work_time.work_minutes() - work_time.break_minutes())
        })
        .sum()
}

/// 実働時間を表示用の文字列にする。実働時間がなければ空文字列を返す。
pub fn format_total(work_times: &[WorkTime]) -> String {
    let total = total_worked(work_times);
    if total.is_zero() {
        return String::new();
    }
    total.to_string()
}

/// カレンダーの1日に表示する実働時間。記録がない日は空文字列を返す。
pub fn work_hours_in_day(day: Option<&WorkDay>) -> String {
    day.map(|day| format_total(&day.work_times))
        .unwrap_or_default()
}
