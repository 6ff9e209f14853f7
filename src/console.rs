use std::io::Write;

use anyhow::{Context, Result};
use serde_json::json;
use worktrack::{format_total, ProjectTimeSpans, TimeSpan, WorkDay};

/// Consoleに勤務記録を表示するためのtrait。
#[cfg_attr(test, mockall::automock)]
pub trait ConsolePresenter {
    /// 1日分の勤務記録と実働時間を表示する。
    ///
    /// # Arguments
    ///
    /// * `day` - 表示する勤務記録
    fn show_work_day(&mut self, day: &WorkDay) -> Result<()>;

    /// 勤怠登録用の時間帯を表示する。
    ///
    /// # Arguments
    ///
    /// * `time_spans` - 表示する時間帯
    /// * `project_times` - プロジェクトごとの時間帯
    fn show_time_spans(
        &mut self,
        time_spans: &[TimeSpan],
        project_times: &[ProjectTimeSpans],
    ) -> Result<()>;
}

/// 勤務記録をMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // 作業時間を開始時刻順に並べ、最後に実働時間を表示する。
    fn show_work_day(&mut self, day: &WorkDay) -> Result<()> {
        writeln!(self.writer, "## {}", day.date).context("Failed to write date")?;

        let mut work_times = day.work_times.clone();
        work_times.sort_by_key(|work_time| work_time.time_from());
        for work_time in &work_times {
            let project = work_time
                .project_id()
                .map(|id| format!(" (project {})", id))
                .unwrap_or_default();
            writeln!(self.writer, "- {}{}", work_time, project)
                .with_context(|| format!("Failed to write work time: {:?}", work_time))?;
        }

        let flags: Vec<String> = [
            (day.homeoffice, "homeoffice".to_string()),
            (day.sick_leave, "sick leave".to_string()),
            (day.vacation && day.off_duty.is_none(), "vacation".to_string()),
            (
                day.off_duty.is_some(),
                day.off_duty
                    .map(|reason| format!("off duty: {}", reason))
                    .unwrap_or_default(),
            ),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect();
        if !flags.is_empty() {
            writeln!(self.writer, "- {}", flags.join(", ")).context("Failed to write flags")?;
        }

        let total = format_total(&day.work_times);
        if !total.is_empty() {
            writeln!(self.writer, "- total: {}", total).context("Failed to write total")?;
        }

        Ok(())
    }

    fn show_time_spans(
        &mut self,
        time_spans: &[TimeSpan],
        project_times: &[ProjectTimeSpans],
    ) -> Result<()> {
        for span in time_spans {
            let range = match (span.from_time, span.to_time) {
                (None, None) => "all day".to_string(),
                (from, to) => format!(
                    "{} ~ {}",
                    from.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
                    to.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
                ),
            };
            writeln!(self.writer, "- {} {:?}: {}", span.date, span.kind, range)
                .with_context(|| format!("Failed to write time span: {:?}", span))?;
        }

        for project in project_times {
            let spans = project
                .time_spans
                .iter()
                .map(|span| {
                    format!(
                        "{}-{}",
                        span.from_time.format("%H:%M"),
                        span.to_time.format("%H:%M")
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            let name = project
                .project
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string());
            writeln!(self.writer, "- {} project {}: {}", project.date, name, spans)
                .with_context(|| format!("Failed to write project times: {:?}", project))?;
        }

        Ok(())
    }
}

/// 勤務記録をJSON形式で表示する。
pub struct ConsoleJson<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleJson<'a, W> {
    /// 新しい`ConsoleJson`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleJson<'a, W> {
    fn show_work_day(&mut self, day: &WorkDay) -> Result<()> {
        let value = json!({
            "day": day,
            "total": format_total(&day.work_times),
        });
        serde_json::to_writer_pretty(&mut *self.writer, &value)
            .context("Failed to write work day as json")?;
        writeln!(self.writer).context("Failed to write newline")?;

        Ok(())
    }

    fn show_time_spans(
        &mut self,
        time_spans: &[TimeSpan],
        project_times: &[ProjectTimeSpans],
    ) -> Result<()> {
        let value = json!({
            "timeSpans": time_spans,
            "projectTimes": project_times,
        });
        serde_json::to_writer_pretty(&mut *self.writer, &value)
            .context("Failed to write time spans as json")?;
        writeln!(self.writer).context("Failed to write newline")?;

        Ok(())
    }
}
