use chrono::{Duration, NaiveDate, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::WorkDay;
use crate::work_time::{hh_mm, WorkTime};

const SEGMENT_SEPARATOR: char = ';';
const BREAK_SEPARATOR: char = '/';
const RANGE_SEPARATOR: char = '-';
const HOUR_SUFFIX: char = 'h';

const DEFAULT_DAY_START_HOURS: i64 = 8;
const DEFAULT_BREAK_MINUTES: i64 = 60;
const DEFAULT_MAX_MINUTES_WITHOUT_BREAK: i64 = 6 * 60;

/// 入力式を作業時間に変換する際の既定値。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// 開始時刻を省略した最初の区間の開始時刻。
    #[serde(with = "hh_mm")]
    pub day_start: NaiveTime,
    /// 自動で挿入する休憩の長さ(分)。
    pub break_minutes: i64,
    /// 休憩なしで連続して作業できる長さ(分)。これを超えると休憩を挿入する。
    pub max_minutes_without_break: i64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::MIN + Duration::hours(DEFAULT_DAY_START_HOURS),
            break_minutes: DEFAULT_BREAK_MINUTES,
            max_minutes_without_break: DEFAULT_MAX_MINUTES_WITHOUT_BREAK,
        }
    }
}

/// 既定の設定で入力式をパースする。
///
/// # Examples
///
/// ```
/// let work_times = worktrack::parse_work_times("8-17/12-13");
/// assert_eq!(work_times[0].to_string(), "08:00-17:00/12:00-13:00");
/// ```
pub fn parse_work_times(input: &str) -> Vec<WorkTime> {
    WorkTimeParser::default().parse(input)
}

/// `8-17/12-13`や`7.5h`、`8-10;11-15/12-13`のような入力式を作業時間に変換する。
///
/// パースできない区間は読み飛ばし、エラーは返さない。
/// すべての区間が不正な場合は空の`Vec`になる。
#[derive(Clone, Debug, Default)]
pub struct WorkTimeParser {
    config: ParserConfig,
}

impl WorkTimeParser {
    /// 新しい`WorkTimeParser`を返す。
    ///
    /// # Arguments
    ///
    /// * `config` - 開始時刻や休憩の既定値
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// 入力式を`;`区切りの区間ごとにパースし、入力順の作業時間を返す。
    ///
    /// 時間数だけの区間(`4h`)は直前の区間の終了時刻から始まる。
    pub fn parse(&self, input: &str) -> Vec<WorkTime> {
        input
            .split(SEGMENT_SEPARATOR)
            .fold(ParseChain::new(self.config.day_start), |chain, segment| {
                self.push_segment(chain, segment)
            })
            .work_times
    }

    /// 入力式をパースし、基準日の`WorkDay`として返す。
    ///
    /// # Arguments
    ///
    /// * `date` - 作業時間を記録する日付
    /// * `input` - 入力式
    pub fn parse_day(&self, date: NaiveDate, input: &str) -> WorkDay {
        WorkDay {
            work_times: self.parse(input),
            ..WorkDay::new(date)
        }
    }

    fn push_segment(&self, mut chain: ParseChain, segment: &str) -> ParseChain {
        match self.parse_segment(segment, &chain) {
            Some(work_time) => chain.advance(work_time),
            None => debug!("Skip invalid work time segment: {:?}", segment),
        }
        chain
    }

    fn parse_segment(&self, segment: &str, chain: &ParseChain) -> Option<WorkTime> {
        // 3つ目以降の`/`の後ろは無視する
        let mut parts = segment.split(BREAK_SEPARATOR);
        let work_input = parts.next().unwrap_or_default();
        let break_input = parts
            .next()
            .map(str::trim)
            .filter(|pause| !pause.is_empty());

        // 時間数で指定された場合は実働時間とみなし、休憩の分だけ終了を後ろにずらす
        let (work, net_hours) = match TimeSpec::parse(work_input)? {
            TimeSpec::Range(start, end) => (Interval::new(start, end)?, false),
            TimeSpec::Hours(minutes) => (Interval::starting_at(chain.cursor, minutes)?, true),
        };

        let pause = match break_input {
            Some(input) => resolve_break(&work, input, net_hours),
            None if net_hours
                && chain.continuous_minutes + work.minutes()
                    > self.config.max_minutes_without_break =>
            {
                work.centered(self.config.break_minutes)
            }
            None => None,
        };

        let work = match pause {
            Some(pause) if net_hours => work.extended_by(pause.minutes())?,
            _ => work,
        };

        let work_time = WorkTime::new(work.start, work.end)?;
        Some(match pause {
            Some(pause) => work_time.with_break(pause.start, pause.end),
            None => work_time,
        })
    }
}

/// 休憩の入力を作業時間に対して解決する。
///
/// 作業時間に収まらない休憩は捨てるが、作業時間自体は有効なままとする。
fn resolve_break(work: &Interval, input: &str, net_hours: bool) -> Option<Interval> {
    let pause = match TimeSpec::parse(input) {
        Some(TimeSpec::Range(start, end)) => Interval::new(start, end).filter(|p| work.contains(p)),
        // 実働時間指定なら作業時間が休憩分伸びるので必ず収まる
        Some(TimeSpec::Hours(minutes)) => work
            .centered(minutes)
            .filter(|p| net_hours || work.contains(p)),
        None => None,
    };
    if pause.is_none() {
        debug!("Drop break {:?} outside of {:?}", input, work);
    }
    pause
}

/// 区間をまたいで引き継ぐパースの状態。
#[derive(Debug)]
struct ParseChain {
    cursor: NaiveTime,
    continuous_minutes: i64,
    work_times: Vec<WorkTime>,
}

impl ParseChain {
    fn new(day_start: NaiveTime) -> Self {
        Self {
            cursor: day_start,
            continuous_minutes: 0,
            work_times: vec![],
        }
    }

    fn advance(&mut self, work_time: WorkTime) {
        self.cursor = work_time.time_to();
        // 連続作業として数えるのは直前の休憩なしの区間だけ
        self.continuous_minutes = if work_time.has_break() {
            0
        } else {
            work_time.work_minutes()
        };
        self.work_times.push(work_time);
    }
}

/// 作業時間または休憩の指定。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimeSpec {
    /// `8-17`, `08:30-12:00`
    Range(NaiveTime, NaiveTime),
    /// `7.5h`を分に換算したもの
    Hours(i64),
}

impl TimeSpec {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        match parse_hours(input) {
            Some(minutes) => Some(Self::Hours(minutes)),
            None => parse_time_range(input).map(|(start, end)| Self::Range(start, end)),
        }
    }
}

/// `8h`や`7.5h`を分に換算する。小数部は1桁まで。
fn parse_hours(input: &str) -> Option<i64> {
    let number = input.strip_suffix(HOUR_SUFFIX)?;
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !is_digits(whole) || fraction.len() > 1 || !is_digits(fraction) {
        return None;
    }

    let hours: i64 = whole.parse().ok()?;
    let tenths: i64 = if fraction.is_empty() { 0 } else { fraction.parse().ok()? };
    hours.checked_mul(60)?.checked_add(tenths * 6)
}

fn parse_time_range(input: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = input.split_once(RANGE_SEPARATOR)?;
    if end.contains(RANGE_SEPARATOR) {
        return None;
    }
    Some((parse_time(start.trim())?, parse_time(end.trim())?))
}

/// `HH`または`HH:MM`形式の時刻をパースする。
fn parse_time(input: &str) -> Option<NaiveTime> {
    let (hour, minute) = match input.split_once(':') {
        Some((hour, minute)) => (hour, Some(minute)),
        None => (input, None),
    };
    let hour = parse_clock_number(hour)?;
    let minute = match minute {
        Some(minute) => parse_clock_number(minute)?,
        None => 0,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_clock_number(input: &str) -> Option<u32> {
    if input.is_empty() || input.len() > 2 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

/// 同じ日の中で閉じた時間区間。`start < end`を満たす。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Interval {
    start: NaiveTime,
    end: NaiveTime,
}

impl Interval {
    fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    fn starting_at(start: NaiveTime, minutes: i64) -> Option<Self> {
        Self::new(start, add_minutes(start, minutes)?)
    }

    fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// 区間の中央から始まる指定の長さの区間を返す。
    fn centered(&self, minutes: i64) -> Option<Interval> {
        let center = add_minutes(self.start, self.minutes() / 2)?;
        Self::starting_at(center, minutes)
    }

    fn extended_by(self, minutes: i64) -> Option<Self> {
        Self::new(self.start, add_minutes(self.end, minutes)?)
    }
}

/// 日付をまたぐ場合は`None`を返す。
fn add_minutes(time: NaiveTime, minutes: i64) -> Option<NaiveTime> {
    let (result, overflow) = time.overflowing_add_signed(Duration::try_minutes(minutes)?);
    (overflow == 0).then_some(result)
}
