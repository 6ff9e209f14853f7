use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::models::{FullDayType, Holiday, OffDutyReason, WorkDay};
use crate::work_time::{hh_mm, WorkTime};

/// 勤怠登録で扱う時間帯の種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeSpanType {
    Work,
    Break,
    SickLeave,
    FullDayVacation,
    HalfDayVacation,
    OffDuty,
    OnCallDuty,
    SpecialWork,
}

impl TimeSpanType {
    /// プロジェクトに割り当てる時間帯かどうか。
    pub fn is_project_time(self) -> bool {
        matches!(self, Self::Work | Self::OnCallDuty | Self::SpecialWork)
    }
}

/// 勤怠登録の1つの時間帯。
///
/// 終日の種類では開始、終了時刻を持たない。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TimeSpanType,
    #[serde(default, with = "hh_mm::option", skip_serializing_if = "Option::is_none")]
    pub from_time: Option<NaiveTime>,
    #[serde(default, with = "hh_mm::option", skip_serializing_if = "Option::is_none")]
    pub to_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeoffice: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_duty_reason: Option<OffDutyReason>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub userlock: bool,
}

impl TimeSpan {
    /// 時刻を持たない終日の時間帯を返す。
    pub fn full_day(date: NaiveDate, kind: TimeSpanType) -> Self {
        Self {
            id: None,
            date,
            kind,
            from_time: None,
            to_time: None,
            homeoffice: None,
            off_duty_reason: None,
            userlock: false,
        }
    }

    /// 時刻を持つ時間帯を返す。
    pub fn timed(date: NaiveDate, kind: TimeSpanType, from: NaiveTime, to: NaiveTime) -> Self {
        Self {
            from_time: Some(from),
            to_time: Some(to),
            ..Self::full_day(date, kind)
        }
    }

    fn is_open(&self) -> bool {
        self.from_time.is_none() && self.to_time.is_none()
    }
}

/// プロジェクトに割り当てた時間帯。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeSpan {
    #[serde(with = "hh_mm")]
    pub from_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub to_time: NaiveTime,
}

/// ある日のプロジェクトごとの時間帯。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeSpans {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<i64>,
    pub time_spans: Vec<ProjectTimeSpan>,
}

/// `WorkDay`を登録用の時間帯とプロジェクトごとの時間帯に変換する。
///
/// 休暇の日は作業時間を無視し、終日の時間帯を1つだけ返す。
/// 休憩のある作業時間は、作業、休憩、作業の3つの時間帯に分ける。
///
/// # Arguments
///
/// * `day` - 変換する勤務記録
/// * `holidays` - 半日休暇の判定に使う祝日
pub fn map_to_new_time_spans(
    day: &WorkDay,
    holidays: &[Holiday],
) -> (Vec<TimeSpan>, Vec<ProjectTimeSpans>) {
    if day.vacation {
        let span = match day.off_duty {
            Some(reason) => TimeSpan {
                off_duty_reason: Some(reason),
                ..TimeSpan::full_day(day.date, TimeSpanType::OffDuty)
            },
            None if is_workable_holiday(holidays, day.date) => {
                TimeSpan::full_day(day.date, TimeSpanType::HalfDayVacation)
            }
            None => TimeSpan::full_day(day.date, TimeSpanType::FullDayVacation),
        };
        return (vec![span], vec![]);
    }

    let mut time_spans: Vec<TimeSpan> = vec![];
    let mut project_times: Vec<ProjectTimeSpans> = vec![];
    for work_time in &day.work_times {
        let spans = work_time_to_spans(day, work_time);
        let project_spans = spans
            .iter()
            .filter(|span| span.kind.is_project_time())
            .filter_map(|span| {
                Some(ProjectTimeSpan {
                    from_time: span.from_time?,
                    to_time: span.to_time?,
                })
            });

        match project_times
            .iter_mut()
            .find(|project| project.project == work_time.project_id())
        {
            Some(existing) => existing.time_spans.extend(project_spans),
            None => project_times.push(ProjectTimeSpans {
                date: day.date,
                project: work_time.project_id(),
                time_spans: project_spans.collect(),
            }),
        }
        time_spans.extend(spans);
    }

    // 病欠は最後の作業時間の終了から始める
    if day.sick_leave {
        let latest = time_spans.iter().filter_map(|span| span.to_time).max();
        time_spans.push(TimeSpan {
            from_time: latest,
            ..TimeSpan::full_day(day.date, TimeSpanType::SickLeave)
        });
    }

    (time_spans, project_times)
}

fn work_time_to_spans(day: &WorkDay, work_time: &WorkTime) -> Vec<TimeSpan> {
    let work = |from, to| TimeSpan {
        homeoffice: Some(day.homeoffice),
        ..TimeSpan::timed(day.date, TimeSpanType::Work, from, to)
    };

    match (work_time.break_from(), work_time.break_to()) {
        (Some(break_from), Some(break_to)) => vec![
            work(work_time.time_from(), break_from),
            TimeSpan::timed(day.date, TimeSpanType::Break, break_from, break_to),
            work(break_to, work_time.time_to()),
        ],
        _ => vec![work(work_time.time_from(), work_time.time_to())],
    }
}

/// 期間内の平日に終日の時間帯を作成する。
///
/// 土日と休日扱いの祝日は除く。出勤可能な祝日の休暇は半日休暇になる。
///
/// # Arguments
///
/// * `full_day_type` - 作成する終日の種類
/// * `from` - 期間の開始日
/// * `to` - 期間の終了日(この日を含む)
/// * `holidays` - 祝日
/// * `off_duty_reason` - 特別休暇の理由。省略時は`Other`
pub fn map_full_day_types(
    full_day_type: FullDayType,
    from: NaiveDate,
    to: NaiveDate,
    holidays: &[Holiday],
    off_duty_reason: Option<OffDutyReason>,
) -> Vec<TimeSpan> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| !is_weekend(*date) && !is_day_off_holiday(holidays, *date))
        .map(|date| match full_day_type {
            FullDayType::Vacation if is_workable_holiday(holidays, date) => {
                TimeSpan::full_day(date, TimeSpanType::HalfDayVacation)
            }
            FullDayType::Vacation => TimeSpan::full_day(date, TimeSpanType::FullDayVacation),
            FullDayType::Sick => TimeSpan::full_day(date, TimeSpanType::SickLeave),
            FullDayType::OffDuty => TimeSpan {
                off_duty_reason: Some(off_duty_reason.unwrap_or(OffDutyReason::Other)),
                ..TimeSpan::full_day(date, TimeSpanType::OffDuty)
            },
        })
        .collect()
}

/// 登録済みの時間帯とプロジェクトごとの時間帯から`WorkDay`を復元する。
///
/// 休憩をはさんだ同じプロジェクトの時間帯は、休憩を持つ1つの作業時間にまとめる。
/// 結果は日付順に並ぶ。
pub fn map_to_work_days(
    time_spans: &[TimeSpan],
    project_times: &[ProjectTimeSpans],
) -> Vec<WorkDay> {
    let spans_by_date = time_spans.iter().fold(
        BTreeMap::<NaiveDate, Vec<&TimeSpan>>::new(),
        |mut acc, span| {
            acc.entry(span.date).or_default().push(span);
            acc
        },
    );
    let project_times_by_date = project_times.iter().fold(
        BTreeMap::<NaiveDate, Vec<&ProjectTimeSpans>>::new(),
        |mut acc, project| {
            acc.entry(project.date).or_default().push(project);
            acc
        },
    );

    let mut days: BTreeMap<NaiveDate, WorkDay> = BTreeMap::new();
    for (date, spans) in &spans_by_date {
        let [span] = spans.as_slice() else {
            continue;
        };
        if !span.is_open() {
            continue;
        }

        let day = days
            .entry(*date)
            .or_insert_with(|| init_work_day(*date, spans));
        match span.kind {
            TimeSpanType::FullDayVacation | TimeSpanType::HalfDayVacation => day.vacation = true,
            TimeSpanType::SickLeave => day.sick_leave = true,
            TimeSpanType::OffDuty => {
                day.off_duty = Some(span.off_duty_reason.unwrap_or(OffDutyReason::Other));
                day.vacation = true;
            }
            _ => {}
        }
    }

    for (date, projects) in &project_times_by_date {
        let spans = spans_by_date.get(date).map(Vec::as_slice).unwrap_or(&[]);
        let breaks: Vec<&TimeSpan> = spans
            .iter()
            .copied()
            .filter(|span| span.kind == TimeSpanType::Break)
            .collect();

        let day = days
            .entry(*date)
            .or_insert_with(|| init_work_day(*date, spans));
        for project in projects {
            day.work_times.extend(join_project_spans(project, &breaks));
        }
    }

    info!("Mapped {} work days from {} time spans", days.len(), time_spans.len());
    days.into_values().collect()
}

/// 休憩の前後に分かれたプロジェクトの時間帯を1つの作業時間にまとめる。
fn join_project_spans(project: &ProjectTimeSpans, breaks: &[&TimeSpan]) -> Vec<WorkTime> {
    let mut work_times = vec![];
    let mut pending: Option<(ProjectTimeSpan, &TimeSpan)> = None;

    for span in &project.time_spans {
        if let Some((first, pause)) = pending.take() {
            if pause.to_time == Some(span.from_time) {
                work_times.extend(
                    to_work_time(first.from_time, span.to_time, project.project)
                        .map(|work_time| work_time.with_break_parts(pause.from_time, pause.to_time)),
                );
                continue;
            }
            // 休憩の後半が見つからなかった前半はそのまま残す
            work_times.extend(to_work_time(first.from_time, first.to_time, project.project));
        }

        match breaks
            .iter()
            .find(|pause| pause.from_time == Some(span.to_time))
        {
            Some(pause) => pending = Some((*span, *pause)),
            None => work_times.extend(to_work_time(span.from_time, span.to_time, project.project)),
        }
    }
    if let Some((first, _)) = pending {
        work_times.extend(to_work_time(first.from_time, first.to_time, project.project));
    }

    work_times
}

fn to_work_time(from: NaiveTime, to: NaiveTime, project: Option<i64>) -> Option<WorkTime> {
    let work_time = WorkTime::new(from, to).map(|work_time| work_time.with_project(project));
    if work_time.is_none() {
        warn!("Ignore project time span ending before it starts: {} - {}", from, to);
    }
    work_time
}

fn init_work_day(date: NaiveDate, spans: &[&TimeSpan]) -> WorkDay {
    WorkDay {
        homeoffice: spans.iter().any(|span| span.homeoffice == Some(true)),
        sick_leave: spans
            .iter()
            .any(|span| span.kind == TimeSpanType::SickLeave),
        locked: spans.iter().any(|span| span.userlock),
        ..WorkDay::new(date)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn is_workable_holiday(holidays: &[Holiday], date: NaiveDate) -> bool {
    holidays
        .iter()
        .any(|holiday| holiday.workable && holiday.date == date)
}

fn is_day_off_holiday(holidays: &[Holiday], date: NaiveDate) -> bool {
    holidays
        .iter()
        .any(|holiday| !holiday.workable && holiday.date == date)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use rstest::rstest;

    use super::{
        map_full_day_types, map_to_new_time_spans, map_to_work_days, ProjectTimeSpan,
        ProjectTimeSpans, TimeSpan, TimeSpanType,
    };
    use crate::models::{FullDayType, Holiday, OffDutyReason, WorkDay};
    use crate::work_time::WorkTime;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    fn work(from: u32, to: u32, project: i64) -> WorkTime {
        WorkTime::new(time(from), time(to))
            .unwrap()
            .with_project(Some(project))
    }

    fn work_span(from: u32, to: u32, homeoffice: bool) -> TimeSpan {
        TimeSpan {
            homeoffice: Some(homeoffice),
            ..TimeSpan::timed(date(1), TimeSpanType::Work, time(from), time(to))
        }
    }

    fn project_span(from: u32, to: u32) -> ProjectTimeSpan {
        ProjectTimeSpan {
            from_time: time(from),
            to_time: time(to),
        }
    }

    fn holiday(day: u32, workable: bool) -> Holiday {
        Holiday {
            date: date(day),
            name: "holiday".to_string(),
            workable,
        }
    }

    fn work_day(work_times: Vec<WorkTime>) -> WorkDay {
        WorkDay {
            work_times,
            ..WorkDay::new(date(1))
        }
    }

    #[test]
    fn test_new_time_spans_without_break() {
        let (time_spans, _) = map_to_new_time_spans(&work_day(vec![work(8, 17, 0)]), &[]);

        assert_eq!(time_spans, vec![work_span(8, 17, false)]);
    }

    #[test]
    fn test_new_time_spans_split_by_break() {
        let day = work_day(vec![work(8, 17, 0).with_break(time(12), time(13))]);

        let (time_spans, _) = map_to_new_time_spans(&day, &[]);

        assert_eq!(
            time_spans,
            vec![
                work_span(8, 12, false),
                TimeSpan::timed(date(1), TimeSpanType::Break, time(12), time(13)),
                work_span(13, 17, false),
            ]
        );
    }

    #[test]
    fn test_new_time_spans_homeoffice() {
        let day = WorkDay {
            homeoffice: true,
            ..work_day(vec![work(8, 17, 0)])
        };

        let (time_spans, _) = map_to_new_time_spans(&day, &[]);

        assert_eq!(time_spans[0].homeoffice, Some(true));
    }

    #[test]
    fn test_new_time_spans_merge_projects() {
        let day = work_day(vec![
            work(8, 10, 1),
            work(10, 16, 2).with_break(time(12), time(13)),
            work(16, 17, 1),
        ]);

        let (_, project_times) = map_to_new_time_spans(&day, &[]);

        assert_eq!(
            project_times,
            vec![
                ProjectTimeSpans {
                    date: date(1),
                    project: Some(1),
                    time_spans: vec![project_span(8, 10), project_span(16, 17)],
                },
                ProjectTimeSpans {
                    date: date(1),
                    project: Some(2),
                    time_spans: vec![project_span(10, 12), project_span(13, 16)],
                },
            ]
        );
    }

    #[rstest]
    #[case::after_work(vec![work(8, 10, 1)], Some(time(10)))]
    #[case::without_work(vec![], None)]
    fn test_new_time_spans_sick_leave(
        #[case] work_times: Vec<WorkTime>,
        #[case] from_time: Option<NaiveTime>,
    ) {
        let day = WorkDay {
            sick_leave: true,
            homeoffice: true,
            ..work_day(work_times)
        };

        let (time_spans, _) = map_to_new_time_spans(&day, &[]);

        assert_eq!(
            time_spans.last(),
            Some(&TimeSpan {
                from_time,
                ..TimeSpan::full_day(date(1), TimeSpanType::SickLeave)
            })
        );
    }

    #[rstest]
    #[case::full_day(vec![], TimeSpanType::FullDayVacation)]
    #[case::workable_holiday(vec![holiday(1, true)], TimeSpanType::HalfDayVacation)]
    #[case::day_off_holiday(vec![holiday(1, false)], TimeSpanType::FullDayVacation)]
    fn test_new_time_spans_vacation(#[case] holidays: Vec<Holiday>, #[case] kind: TimeSpanType) {
        let day = WorkDay {
            vacation: true,
            homeoffice: true,
            ..work_day(vec![work(8, 10, 1)])
        };

        let (time_spans, project_times) = map_to_new_time_spans(&day, &holidays);

        assert_eq!(time_spans, vec![TimeSpan::full_day(date(1), kind)]);
        assert!(project_times.is_empty());
    }

    #[test]
    fn test_new_time_spans_off_duty() {
        let day = WorkDay {
            vacation: true,
            off_duty: Some(OffDutyReason::ChangeOfResidence),
            ..work_day(vec![work(8, 10, 1)])
        };

        let (time_spans, _) = map_to_new_time_spans(&day, &[]);

        assert_eq!(
            time_spans,
            vec![TimeSpan {
                off_duty_reason: Some(OffDutyReason::ChangeOfResidence),
                ..TimeSpan::full_day(date(1), TimeSpanType::OffDuty)
            }]
        );
    }

    /// 2020-01-04と05は土日。
    #[rstest]
    #[case::vacation(FullDayType::Vacation, TimeSpanType::FullDayVacation, None)]
    #[case::sick(FullDayType::Sick, TimeSpanType::SickLeave, None)]
    #[case::off_duty(FullDayType::OffDuty, TimeSpanType::OffDuty, Some(OffDutyReason::Other))]
    fn test_full_day_types_without_weekend(
        #[case] full_day_type: FullDayType,
        #[case] kind: TimeSpanType,
        #[case] reason: Option<OffDutyReason>,
    ) {
        let time_spans = map_full_day_types(full_day_type, date(1), date(5), &[], None);

        let expected: Vec<TimeSpan> = (1..=3)
            .map(|day| TimeSpan {
                off_duty_reason: reason,
                ..TimeSpan::full_day(date(day), kind)
            })
            .collect();
        assert_eq!(time_spans, expected);
    }

    #[test]
    fn test_full_day_types_with_holidays() {
        let holidays = [holiday(1, false), holiday(2, true)];

        let time_spans = map_full_day_types(FullDayType::Vacation, date(1), date(3), &holidays, None);

        assert_eq!(
            time_spans,
            vec![
                TimeSpan::full_day(date(2), TimeSpanType::HalfDayVacation),
                TimeSpan::full_day(date(3), TimeSpanType::FullDayVacation),
            ]
        );
    }

    #[test]
    fn test_full_day_types_with_reason() {
        let time_spans = map_full_day_types(
            FullDayType::OffDuty,
            date(2),
            date(2),
            &[],
            Some(OffDutyReason::Wedding),
        );

        assert_eq!(time_spans[0].off_duty_reason, Some(OffDutyReason::Wedding));
    }

    #[test]
    fn test_full_day_types_empty_range() {
        assert!(map_full_day_types(FullDayType::Sick, date(3), date(2), &[], None).is_empty());
    }

    #[test]
    fn test_work_days_join_break() {
        let time_spans = [
            work_span(8, 10, true),
            TimeSpan::timed(date(1), TimeSpanType::Break, time(10), time(12)),
            work_span(12, 15, true),
        ];
        let project_times = [ProjectTimeSpans {
            date: date(1),
            project: Some(1),
            time_spans: vec![project_span(8, 10), project_span(12, 15)],
        }];

        let work_days = map_to_work_days(&time_spans, &project_times);

        assert_eq!(
            work_days,
            vec![WorkDay {
                homeoffice: true,
                ..work_day(vec![work(8, 15, 1).with_break(time(10), time(12))])
            }]
        );
    }

    #[test]
    fn test_work_days_full_days() {
        let time_spans = [
            TimeSpan::full_day(date(1), TimeSpanType::FullDayVacation),
            TimeSpan {
                off_duty_reason: Some(OffDutyReason::ChangeOfResidence),
                ..TimeSpan::full_day(date(2), TimeSpanType::OffDuty)
            },
            TimeSpan::full_day(date(3), TimeSpanType::SickLeave),
        ];

        let work_days = map_to_work_days(&time_spans, &[]);

        assert_eq!(work_days.len(), 3);
        assert!(work_days[0].vacation);
        assert_eq!(work_days[1].off_duty, Some(OffDutyReason::ChangeOfResidence));
        assert!(work_days[1].vacation);
        assert!(work_days[2].sick_leave);
        assert!(!work_days[2].vacation);
    }

    #[test]
    fn test_work_days_half_sick_day() {
        let time_spans = [
            work_span(8, 10, false),
            TimeSpan {
                from_time: Some(time(10)),
                ..TimeSpan::full_day(date(1), TimeSpanType::SickLeave)
            },
        ];
        let project_times = [ProjectTimeSpans {
            date: date(1),
            project: Some(1),
            time_spans: vec![project_span(8, 10)],
        }];

        let work_days = map_to_work_days(&time_spans, &project_times);

        assert_eq!(
            work_days,
            vec![WorkDay {
                sick_leave: true,
                ..work_day(vec![work(8, 10, 1)])
            }]
        );
    }

    #[rstest]
    #[case::full_day(
        vec![TimeSpan { userlock: true, ..TimeSpan::full_day(date(1), TimeSpanType::FullDayVacation) }],
        vec![],
    )]
    #[case::work_day(
        vec![TimeSpan { userlock: true, ..work_span(8, 10, false) }],
        vec![ProjectTimeSpans { date: date(1), project: Some(1), time_spans: vec![project_span(8, 10)] }],
    )]
    fn test_work_days_locked(
        #[case] time_spans: Vec<TimeSpan>,
        #[case] project_times: Vec<ProjectTimeSpans>,
    ) {
        let work_days = map_to_work_days(&time_spans, &project_times);

        assert!(work_days[0].locked);
    }

    /// 休憩の後半がない場合も前半の作業時間は残す。
    #[test]
    fn test_work_days_keep_unmatched_half() {
        let time_spans = [
            work_span(8, 10, false),
            TimeSpan::timed(date(1), TimeSpanType::Break, time(10), time(11)),
            work_span(13, 15, false),
        ];
        let project_times = [ProjectTimeSpans {
            date: date(1),
            project: Some(1),
            time_spans: vec![project_span(8, 10), project_span(13, 15)],
        }];

        let work_days = map_to_work_days(&time_spans, &project_times);

        assert_eq!(
            work_days[0].work_times,
            vec![work(8, 10, 1), work(13, 15, 1)]
        );
    }

    #[test]
    fn test_round_trip_through_time_spans() {
        let day = WorkDay {
            homeoffice: true,
            ..work_day(vec![
                work(8, 10, 1),
                work(10, 16, 2).with_break(time(12), time(13)),
            ])
        };

        let (time_spans, project_times) = map_to_new_time_spans(&day, &[]);
        let work_days = map_to_work_days(&time_spans, &project_times);

        assert_eq!(work_days, vec![day]);
    }

    #[test]
    fn test_time_span_json() {
        let span = TimeSpan {
            off_duty_reason: Some(OffDutyReason::Other),
            ..TimeSpan::full_day(date(2), TimeSpanType::OffDuty)
        };

        assert_eq!(
            serde_json::to_value(&span).unwrap(),
            serde_json::json!({
                "date": "2020-01-02",
                "type": "offDuty",
                "offDutyReason": "other",
            })
        );
    }
}
