use std::fmt;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// 時刻を`HH:MM`形式でシリアライズするためのモジュール。
pub(crate) mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(D::Error::custom)
    }

    /// 省略可能な時刻用。
    pub mod option {
        use chrono::NaiveTime;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|s| NaiveTime::parse_from_str(&s, super::FORMAT).map_err(D::Error::custom))
                .transpose()
        }
    }
}

/// 1日の中の1つの作業時間。
///
/// `time_from < time_to`を常に満たす。休憩は開始と終了の両方が揃い、
/// かつ作業時間の範囲に収まる場合のみ保持する。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorkTimeRecord", into = "WorkTimeRecord")]
pub struct WorkTime {
    time_from: NaiveTime,
    time_to: NaiveTime,
    break_time: Option<(NaiveTime, NaiveTime)>,
    project_id: Option<i64>,
}

impl WorkTime {
    /// 新しい`WorkTime`を返す。
    ///
    /// 終了時刻が開始時刻より後でない場合は`None`を返す。
    pub fn new(time_from: NaiveTime, time_to: NaiveTime) -> Option<Self> {
        (time_from < time_to).then_some(Self {
            time_from,
            time_to,
            break_time: None,
            project_id: None,
        })
    }

    /// 休憩を設定した`WorkTime`を返す。
    ///
    /// 休憩が作業時間に収まらない場合は休憩なしとする。
    pub fn with_break(mut self, break_from: NaiveTime, break_to: NaiveTime) -> Self {
        let within = self.time_from <= break_from && break_to <= self.time_to;
        self.break_time = (break_from < break_to && within).then_some((break_from, break_to));
        self
    }

    /// 片方しか指定されていない休憩は休憩なしとして扱う。
    pub fn with_break_parts(self, break_from: Option<NaiveTime>, break_to: Option<NaiveTime>) -> Self {
        match (break_from, break_to) {
            (Some(from), Some(to)) => self.with_break(from, to),
            _ => self.without_break(),
        }
    }

    pub fn without_break(mut self) -> Self {
        self.break_time = None;
        self
    }

    pub fn with_project(mut self, project_id: Option<i64>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn time_from(&self) -> NaiveTime {
        self.time_from
    }

    pub fn time_to(&self) -> NaiveTime {
        self.time_to
    }

    pub fn break_from(&self) -> Option<NaiveTime> {
        self.break_time.map(|(from, _)| from)
    }

    pub fn break_to(&self) -> Option<NaiveTime> {
        self.break_time.map(|(_, to)| to)
    }

    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    pub fn has_break(&self) -> bool {
        self.break_time.is_some()
    }

    /// 休憩を含む作業時間の長さ(分)。
    pub fn work_minutes(&self) -> i64 {
        (self.time_to - self.time_from).num_minutes()
    }

    /// 休憩の長さ(分)。休憩がなければ0。
    pub fn break_minutes(&self) -> i64 {
        self.break_time
            .map(|(from, to)| (to - from).num_minutes())
            .unwrap_or(0)
    }

    /// 指定した日付上の開始日時と終了日時を返す。
    ///
    /// # Arguments
    ///
    /// * `date` - 基準となる日付
    pub fn interval_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.time_from), date.and_time(self.time_to))
    }
}

/// `08:00-17:00/12:00-13:00`形式で表示する。
///
/// この表記は再度パースすると同じ`WorkTime`になる。
impl fmt::Display for WorkTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.time_from.format(hh_mm::FORMAT),
            self.time_to.format(hh_mm::FORMAT)
        )?;
        if let Some((from, to)) = self.break_time {
            write!(f, "/{}-{}", from.format(hh_mm::FORMAT), to.format(hh_mm::FORMAT))?;
        }
        Ok(())
    }
}

/// 複数の作業時間を`;`区切りの入力式に戻す。
pub fn format_work_times(work_times: &[WorkTime]) -> String {
    work_times
        .iter()
        .map(WorkTime::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// 日毎の記録として受け渡しされる作業時間の形式。
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkTimeRecord {
    #[serde(with = "hh_mm")]
    time_from: NaiveTime,
    #[serde(with = "hh_mm")]
    time_to: NaiveTime,
    #[serde(default, with = "hh_mm::option", skip_serializing_if = "Option::is_none")]
    break_from: Option<NaiveTime>,
    #[serde(default, with = "hh_mm::option", skip_serializing_if = "Option::is_none")]
    break_to: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<i64>,
}

impl TryFrom<WorkTimeRecord> for WorkTime {
    type Error = anyhow::Error;

    fn try_from(record: WorkTimeRecord) -> anyhow::Result<Self> {
        let work_time = WorkTime::new(record.time_from, record.time_to).with_context(|| {
            format!(
                "Work time must end after it starts: {} - {}",
                record.time_from, record.time_to
            )
        })?;

        Ok(work_time
            .with_break_parts(record.break_from, record.break_to)
            .with_project(record.project_id))
    }
}

impl From<WorkTime> for WorkTimeRecord {
    fn from(work_time: WorkTime) -> Self {
        Self {
            time_from: work_time.time_from,
            time_to: work_time.time_to,
            break_from: work_time.break_from(),
            break_to: work_time.break_to(),
            project_id: work_time.project_id,
        }
    }
}
