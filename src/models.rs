use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::work_time::WorkTime;

/// 1日分の勤務記録。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub work_times: Vec<WorkTime>,
    #[serde(default)]
    pub sick_leave: bool,
    #[serde(default)]
    pub homeoffice: bool,
    #[serde(default)]
    pub vacation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_duty: Option<OffDutyReason>,
    #[serde(default)]
    pub locked: bool,
}

impl WorkDay {
    /// 作業時間のない`WorkDay`を返す。
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            work_times: vec![],
            sick_leave: false,
            homeoffice: false,
            vacation: false,
            off_duty: None,
            locked: false,
        }
    }

    /// 休暇、病欠、作業時間のいずれも記録されていない場合に`true`を返す。
    pub fn is_empty(&self) -> bool {
        self.work_times.is_empty() && !self.sick_leave && !self.vacation
    }
}

/// 祝日。
///
/// `workable`な祝日の休暇は半日休暇として扱う。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub workable: bool,
}

/// 作業時間を割り当てるプロジェクト。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_to: Option<NaiveDate>,
}

impl Project {
    /// 指定日にプロジェクトが有効かどうかを返す。期間の指定がない側は無制限とする。
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active_from.map_or(true, |from| from <= date)
            && self.active_to.map_or(true, |to| date <= to)
    }
}

/// 期間でまとめて登録する終日の種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FullDayType {
    Vacation,
    Sick,
    OffDuty,
}

impl FromStr for FullDayType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "vacation" => Ok(Self::Vacation),
            "sick" => Ok(Self::Sick),
            "off-duty" => Ok(Self::OffDuty),
            _ => bail!("Unknown full day type: {} (expected vacation, sick or off-duty)", s),
        }
    }
}

/// 特別休暇の理由。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OffDutyReason {
    ChangeOfResidence,
    Wedding,
    Bereavement,
    Other,
}

impl FromStr for OffDutyReason {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "change-of-residence" => Ok(Self::ChangeOfResidence),
            "wedding" => Ok(Self::Wedding),
            "bereavement" => Ok(Self::Bereavement),
            "other" => Ok(Self::Other),
            _ => bail!("Unknown off duty reason: {}", s),
        }
    }
}

impl fmt::Display for OffDutyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChangeOfResidence => "change-of-residence",
            Self::Wedding => "wedding",
            Self::Bereavement => "bereavement",
            Self::Other => "other",
        })
    }
}
