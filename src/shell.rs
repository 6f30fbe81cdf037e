//! Executes shell commands against a `Calendar`.
//!
//! The shell owns the one `SessionContext`; `cd` is the only command that
//! replaces it. Everything else resolves against it and leaves it alone.

use std::io::Write;

use anyhow::Result;
use calsh_core::date_range::{date_of, DateRange};
use calsh_core::event::{EventStatus, NewEvent};
use calsh_core::time_span::TimeSpan;
use calsh_core::{resolve, resolve_path, ErrorKind, Notice, PathError, Resolved, ResolvedTriple, SessionContext};
use chrono_tz::Tz;

use crate::command::{self, Command, CommandError};
use crate::remote::Calendar;
use crate::render;

/// What the REPL should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Clear,
    Exit,
}

pub struct Shell<C> {
    context: SessionContext,
    calendar: C,
    timezone: Tz,
}

impl<C: Calendar> Shell<C> {
    pub fn new(context: SessionContext, calendar: C, timezone: Tz) -> Self {
        Shell {
            context,
            calendar,
            timezone,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn prompt(&self) -> String {
        self.context.prompt()
    }

    /// Run one line. Listings and notices go to `out`; errors that do not
    /// stop the command (one bad path among several) go to `err`.
    pub async fn execute(&mut self, line: &str, out: &mut impl Write, err: &mut impl Write) -> Result<Flow> {
        let Some(command) = command::parse(line)? else {
            return Ok(Flow::Continue);
        };
        log::debug!("{:?} at {}", command, self.context);

        match command {
            Command::Cd(path) => self.cd(&path, out)?,
            Command::Ls(paths) => self.ls(&paths, out, err).await?,
            Command::Add { path, span, summary } => self.add(path.as_deref(), span, &summary, out).await?,
            Command::Rm(ids) => self.rm(&ids, out, err).await?,
            Command::Pwd => writeln!(out, "{}", self.context)?,
            Command::Clear => return Ok(Flow::Clear),
            Command::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }

    fn cd(&mut self, path: &str, out: &mut impl Write) -> Result<()> {
        if let Some(context) = settle(resolve(&self.context, path), out)? {
            self.context = context;
        }
        Ok(())
    }

    async fn ls(&self, paths: &[String], out: &mut impl Write, err: &mut impl Write) -> Result<()> {
        if paths.is_empty() {
            if self.context.depth() < ResolvedTriple::MAX_DEPTH {
                return Err(CommandError::NotADay("list events without a path").into());
            }
            return self.list(self.context.triple(), out).await;
        }

        let with_headers = paths.len() > 1;
        for (i, path) in paths.iter().enumerate() {
            if with_headers {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "{}", render::header(path))?;
            }

            // Every path resolves against the context the command started in.
            if let Err(e) = self.list_path(path, out).await {
                writeln!(err, "{}", render::error(format!("{}: {:#}", path, e)))?;
            }
        }

        Ok(())
    }

    async fn list_path(&self, path: &str, out: &mut impl Write) -> Result<()> {
        match settle(resolve_path(&self.context, path), out)? {
            Some(triple) => self.list(&triple, out).await,
            None => Ok(()),
        }
    }

    async fn list(&self, triple: &ResolvedTriple, out: &mut impl Write) -> Result<()> {
        let range = DateRange::for_triple(triple, self.timezone)?;
        let tz = self.timezone;

        let mut events = self.calendar.list_events(&range).await?;
        events.retain(|e| e.status != EventStatus::Cancelled && e.overlaps(&range, tz));
        events.sort_by_key(|e| e.start.instant(tz));

        write!(out, "{}", render::events(&events, tz))?;
        Ok(())
    }

    async fn add(
        &self,
        path: Option<&str>,
        span: Option<TimeSpan>,
        summary: &str,
        out: &mut impl Write,
    ) -> Result<()> {
        let triple = match path {
            Some(path) => match settle(resolve_path(&self.context, path), out)? {
                Some(triple) => triple,
                None => return Ok(()),
            },
            None => self.context.triple().clone(),
        };

        if !triple.is_full() {
            return Err(CommandError::NotADay("add an event").into());
        }

        let date = date_of(&triple)?;
        let new_event = NewEvent::on_date(summary, date, span, self.timezone);
        let event = self.calendar.create_event(&new_event).await?;

        writeln!(out, "Event created: {}", render::event_row(&event, self.timezone))?;
        Ok(())
    }

    async fn rm(&self, ids: &[String], out: &mut impl Write, err: &mut impl Write) -> Result<()> {
        for id in ids {
            match self.calendar.delete_event(id).await {
                Ok(()) => writeln!(out, "Deleted {}", id)?,
                Err(e) => writeln!(err, "{}", render::error(format!("{}: {:#}", id, e)))?,
            }
        }
        Ok(())
    }
}

/// Print notices and unwrap a resolution. Depth errors are only
/// informational and give `None`; other path errors fail the command.
fn settle<T>(result: Result<Resolved<T>, PathError>, out: &mut impl Write) -> Result<Option<T>> {
    match result {
        Ok(resolved) => {
            print_notices(&resolved.notices, out)?;
            Ok(Some(resolved.value))
        }
        Err(e) if e.kind() == ErrorKind::Depth => {
            writeln!(out, "{}", render::info(&e))?;
            Ok(None)
        }
        Err(e) => Err(CommandError::from(e).into()),
    }
}

fn print_notices(notices: &[Notice], out: &mut impl Write) -> Result<()> {
    for notice in notices {
        writeln!(out, "{}", render::notice(notice))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use calsh_core::event::{Event, EventTime};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::cell::RefCell;

    /// Calendar kept in memory, recording the windows it was asked for.
    #[derive(Default)]
    struct MemoryCalendar {
        events: RefCell<Vec<Event>>,
        queries: RefCell<Vec<DateRange>>,
    }

    impl MemoryCalendar {
        fn with(events: Vec<Event>) -> Self {
            MemoryCalendar {
                events: RefCell::new(events),
                queries: RefCell::default(),
            }
        }
    }

    impl Calendar for MemoryCalendar {
        async fn list_events(&self, range: &DateRange) -> Result<Vec<Event>> {
            self.queries.borrow_mut().push(range.clone());
            Ok(self.events.borrow().clone())
        }

        async fn create_event(&self, event: &NewEvent) -> Result<Event> {
            let mut events = self.events.borrow_mut();
            let created = Event {
                id: format!("ev{}", events.len() + 1),
                summary: event.summary.clone(),
                location: None,
                start: event.start.clone(),
                end: event.end.clone(),
                status: EventStatus::Confirmed,
            };
            events.push(created.clone());
            Ok(created)
        }

        async fn delete_event(&self, event_id: &str) -> Result<()> {
            let mut events = self.events.borrow_mut();
            let before = events.len();
            events.retain(|e| e.id != event_id);
            if events.len() == before {
                bail!("No event with id {}", event_id);
            }
            Ok(())
        }
    }

    fn all_day(id: &str, summary: &str, y: i32, m: u32, d: u32) -> Event {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Event {
            id: id.into(),
            summary: summary.into(),
            location: None,
            start: EventTime::Date(date),
            end: EventTime::Date(date.succ_opt().unwrap()),
            status: EventStatus::Confirmed,
        }
    }

    fn shell_at(parts: (Option<&str>, Option<&str>, Option<&str>), events: Vec<Event>) -> Shell<MemoryCalendar> {
        let mut context = SessionContext::new("primary");
        let target = ResolvedTriple::from_parts(parts.0, parts.1, parts.2).unwrap();
        if !target.is_root() {
            context = resolve(&context, &target.to_string()).unwrap().value;
        }
        Shell::new(context, MemoryCalendar::with(events), Tz::UTC)
    }

    struct Output {
        out: Vec<u8>,
        err: Vec<u8>,
    }

    impl Output {
        fn stdout(&self) -> String {
            String::from_utf8_lossy(&self.out).into_owned()
        }

        fn stderr(&self) -> String {
            String::from_utf8_lossy(&self.err).into_owned()
        }
    }

    async fn run(shell: &mut Shell<MemoryCalendar>, line: &str) -> (Result<Flow>, Output) {
        let mut output = Output {
            out: Vec::new(),
            err: Vec::new(),
        };
        let flow = shell.execute(line, &mut output.out, &mut output.err).await;
        (flow, output)
    }

    #[tokio::test]
    async fn cd_walks_the_scenario() {
        let mut shell = shell_at((None, None, None), vec![]);

        run(&mut shell, "cd 2024").await.0.unwrap();
        assert_eq!(shell.context().to_string(), "primary/2024");

        run(&mut shell, "cd 05/03").await.0.unwrap();
        assert_eq!(shell.context().to_string(), "primary/2024/05/03");

        run(&mut shell, "cd ..").await.0.unwrap();
        assert_eq!(shell.context().to_string(), "primary/2024/05");

        run(&mut shell, "cd .../01").await.0.unwrap();
        assert_eq!(shell.context().to_string(), "primary/01");
        assert_eq!(shell.prompt(), "primary/01 >>> ");
    }

    #[tokio::test]
    async fn failed_cd_keeps_context() {
        let mut shell = shell_at((Some("2024"), Some("05"), None), vec![]);

        let (flow, _) = run(&mut shell, "cd 2024/13/01").await;
        let err = flow.unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(shell.context().to_string(), "primary/2024/05");
    }

    #[tokio::test]
    async fn cd_above_root_is_a_notice() {
        let mut shell = shell_at((None, None, None), vec![]);

        let (flow, output) = run(&mut shell, "cd ..").await;
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert!(output.stdout().contains("already at the top"));
        assert!(shell.context().triple().is_root());
    }

    #[tokio::test]
    async fn cd_below_the_day_is_informational() {
        let mut shell = shell_at((Some("2024"), Some("05"), Some("03")), vec![]);

        let (flow, output) = run(&mut shell, "cd 04").await;
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert!(output.stdout().contains("already at the bottom level"));
        assert!(!output.stdout().contains("Error"));
        assert!(output.stderr().is_empty());
        assert_eq!(shell.context().to_string(), "primary/2024/05/03");
    }

    #[tokio::test]
    async fn ls_and_add_below_the_day_do_nothing() {
        let mut shell = shell_at((Some("2024"), Some("05"), Some("03")), vec![]);

        let (flow, output) = run(&mut shell, "ls 04").await;
        flow.unwrap();
        assert!(output.stdout().contains("already at the bottom level"));
        assert!(output.stderr().is_empty());
        assert!(shell.calendar.queries.borrow().is_empty());

        let (flow, output) = run(&mut shell, "add ./04 Dentist").await;
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert!(output.stdout().contains("already at the bottom level"));
        assert!(shell.calendar.events.borrow().is_empty());
    }

    #[tokio::test]
    async fn ls_lists_the_current_day() {
        let mut shell = shell_at(
            (Some("2024"), Some("05"), Some("03")),
            vec![
                all_day("b", "Second", 2024, 5, 3),
                all_day("x", "Elsewhere", 2024, 6, 1),
            ],
        );

        let (flow, output) = run(&mut shell, "ls").await;
        flow.unwrap();

        let stdout = output.stdout();
        assert!(stdout.contains("Second"));
        assert!(!stdout.contains("Elsewhere"));
        assert_eq!(
            shell.calendar.queries.borrow()[0].from,
            Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn ls_without_path_needs_a_full_context() {
        let mut shell = shell_at((Some("2024"), Some("05"), None), vec![]);

        let err = run(&mut shell, "ls").await.0.unwrap_err();
        assert!(err.to_string().contains("A year, month and day are required"));
        assert!(shell.calendar.queries.borrow().is_empty());
    }

    #[tokio::test]
    async fn ls_range_error_lists_nothing() {
        let mut shell = shell_at((Some("2024"), None, None), vec![]);

        let (flow, output) = run(&mut shell, "ls 2024/13/01").await;
        flow.unwrap();
        assert!(output.stderr().contains("out of range"));
        assert!(output.stdout().is_empty());
        assert!(shell.calendar.queries.borrow().is_empty());
        assert_eq!(shell.context().to_string(), "primary/2024");
    }

    #[tokio::test]
    async fn ls_resolves_each_path_against_the_original_context() {
        let mut shell = shell_at(
            (Some("2024"), None, None),
            vec![
                all_day("a", "January", 2024, 1, 2),
                all_day("b", "March", 2024, 3, 4),
            ],
        );

        let (flow, output) = run(&mut shell, "ls 01/02 03/04").await;
        flow.unwrap();

        let queries = shell.calendar.queries.borrow();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].from, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(queries[1].from, Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap());

        let stdout = output.stdout();
        assert!(stdout.contains("01/02:"));
        assert!(stdout.contains("03/04:"));
        assert!(stdout.contains("January"));
        assert!(stdout.contains("March"));
        assert_eq!(shell.context().to_string(), "primary/2024");
    }

    #[tokio::test]
    async fn ls_keeps_going_after_a_bad_path() {
        let mut shell = shell_at((Some("2024"), None, None), vec![]);

        let (flow, output) = run(&mut shell, "ls 13/01 05").await;
        flow.unwrap();
        assert!(output.stderr().contains("13/01"));
        assert_eq!(shell.calendar.queries.borrow().len(), 1);
        assert!(output.stdout().contains("No events"));
    }

    #[tokio::test]
    async fn ls_refuses_the_root() {
        let mut shell = shell_at((Some("2024"), None, None), vec![]);

        let (flow, output) = run(&mut shell, "ls ..").await;
        flow.unwrap();
        assert!(output.stderr().contains("A year is required"));
    }

    #[tokio::test]
    async fn ls_reports_impossible_dates() {
        let mut shell = shell_at((Some("2023"), None, None), vec![]);

        let (flow, output) = run(&mut shell, "ls 02/30").await;
        flow.unwrap();
        assert!(output.stderr().contains("not a calendar date"));
    }

    #[tokio::test]
    async fn ls_hides_cancelled_events_and_sorts() {
        let mut cancelled = all_day("c", "Cancelled", 2024, 5, 3);
        cancelled.status = EventStatus::Cancelled;
        let mut shell = shell_at(
            (Some("2024"), Some("05"), None),
            vec![
                all_day("late", "Later", 2024, 5, 20),
                cancelled,
                all_day("early", "Earlier", 2024, 5, 1),
            ],
        );

        let (flow, output) = run(&mut shell, "ls .").await;
        flow.unwrap();

        let stdout = output.stdout();
        assert!(!stdout.contains("Cancelled"));
        let earlier = stdout.find("Earlier").unwrap();
        let later = stdout.find("Later").unwrap();
        assert!(earlier < later);
    }

    #[tokio::test]
    async fn add_creates_all_day_event_in_context() {
        let mut shell = shell_at((Some("2024"), Some("05"), Some("03")), vec![]);

        let (flow, output) = run(&mut shell, "add Dentist").await;
        flow.unwrap();
        assert!(output.stdout().contains("Event created: 2024-05-03 ~ 2024-05-04  Dentist"));

        let events = shell.calendar.events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, EventTime::Date(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
    }

    #[tokio::test]
    async fn add_with_path_and_span() {
        let mut shell = shell_at((Some("2024"), None, None), vec![]);

        let (flow, output) = run(&mut shell, "add 05/03 10:00-11:00 Team sync").await;
        flow.unwrap();
        assert!(output.stdout().contains("2024-05-03 10:00 ~ 2024-05-03 11:00  Team sync"));
        assert_eq!(shell.context().to_string(), "primary/2024");
    }

    #[tokio::test]
    async fn add_needs_a_day() {
        let mut shell = shell_at((Some("2024"), Some("05"), None), vec![]);

        let err = run(&mut shell, "add Dentist").await.0.unwrap_err();
        assert!(err.to_string().contains("A year, month and day are required"));
        assert!(shell.calendar.events.borrow().is_empty());
    }

    #[tokio::test]
    async fn rm_deletes_and_reports_missing_ids() {
        let mut shell = shell_at((None, None, None), vec![all_day("a", "One", 2024, 5, 3)]);

        let (flow, output) = run(&mut shell, "rm a zzz").await;
        flow.unwrap();
        assert!(output.stdout().contains("Deleted a"));
        assert!(output.stderr().contains("zzz"));
        assert!(shell.calendar.events.borrow().is_empty());
    }

    #[tokio::test]
    async fn pwd_clear_and_exit() {
        let mut shell = shell_at((Some("2024"), Some("05"), None), vec![]);

        let (flow, output) = run(&mut shell, "pwd").await;
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert_eq!(output.stdout(), "primary/2024/05\n");

        assert_eq!(run(&mut shell, "clear").await.0.unwrap(), Flow::Clear);
        assert_eq!(run(&mut shell, "exit").await.0.unwrap(), Flow::Exit);
        assert_eq!(run(&mut shell, "").await.0.unwrap(), Flow::Continue);
    }

    #[tokio::test]
    async fn unknown_command_is_an_error() {
        let mut shell = shell_at((None, None, None), vec![]);
        let err = run(&mut shell, "mkdir x").await.0.unwrap_err();
        assert!(err.to_string().contains("Unknown command 'mkdir'"));
    }
}
