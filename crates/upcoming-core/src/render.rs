//! Fixed-width terminal box rendering.
//!
//! The box is one column-exact frame per event:
//!
//! ```text
//! |----------------------|
//! | Standup              |
//! | Friday    09:05      |
//! |----------------------|
//! ```
//!
//! Titles longer than the content column are split onto as many lines as
//! needed. Every line, borders included, is exactly [`Terminal::width`]
//! terminal columns wide. The whole box is built as a `String`
//! before anything is written, so a bad event never leaves half a box on
//! screen.

use std::io;

use thiserror::Error;
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::event::{Event, StartTime, StartTimeError};

/// Width of the weekday field on the second line of each event.
const WEEKDAY_FIELD_WIDTH: usize = 10;

/// Errors produced while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The terminal size could not be queried.
    #[error("failed to determine terminal size: {0}")]
    TerminalSize(#[source] io::Error),

    /// The terminal cannot fit the borders plus any content.
    #[error("terminal too narrow: {width} columns, need at least {min}", min = Terminal::MIN_WIDTH)]
    TooNarrow { width: usize },

    /// An event start could not be parsed.
    #[error("event {title:?} has an unusable start: {source}")]
    MalformedStart {
        title: String,
        #[source]
        source: StartTimeError,
    },
}

/// Output region dimensions, in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    width: usize,
    height: usize,
}

impl Terminal {
    /// Narrowest width that leaves room for `| `, one character and ` |`.
    pub const MIN_WIDTH: usize = 7;

    /// Creates a terminal of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        if width < Self::MIN_WIDTH {
            return Err(RenderError::TooNarrow { width });
        }
        Ok(Self { width, height })
    }

    /// Queries the size of the controlling terminal.
    pub fn detect() -> Result<Self, RenderError> {
        let (cols, rows) = crossterm::terminal::size().map_err(RenderError::TerminalSize)?;
        debug!(cols, rows, "detected terminal size");
        Self::new(usize::from(cols), usize::from(rows))
    }

    /// Total width, borders included.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows. Recorded only; the box is never clipped to it.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Characters available between `| ` and ` |`.
    pub fn content_width(&self) -> usize {
        self.width - 4
    }

    /// A separator line: `|` + dashes + `|`.
    pub fn horizontal(&self) -> String {
        let mut line = String::with_capacity(self.width);
        line.push('|');
        line.extend(std::iter::repeat_n('-', self.width - 2));
        line.push('|');
        line
    }

    /// Boxes `text` into one or more content lines.
    ///
    /// Text is wrapped by display columns, so wide characters take two
    /// cells. Control characters are drawn as spaces. An empty string
    /// yields no lines.
    pub fn line(&self, text: &str) -> Vec<String> {
        let max = self.content_width();
        let mut lines = Vec::new();
        let mut chunk = String::new();
        let mut used = 0;

        for c in text.chars() {
            let c = if c.is_control() { ' ' } else { c };
            let cells = c.width().unwrap_or(0);
            if used + cells > max {
                lines.push(self.boxed(&chunk, used));
                chunk.clear();
                used = 0;
            }
            chunk.push(c);
            used += cells;
        }
        if !chunk.is_empty() {
            lines.push(self.boxed(&chunk, used));
        }
        lines
    }

    fn boxed(&self, chunk: &str, used: usize) -> String {
        let mut line = String::with_capacity(self.width);
        line.push_str("| ");
        line.push_str(chunk);
        line.extend(std::iter::repeat_n(' ', self.content_width() - used));
        line.push_str(" |");
        line
    }
}

/// Renders `events` as a bordered box, one block per event in the given order.
///
/// Each line is terminated by `\n`.
pub fn render_events(terminal: &Terminal, events: &[Event]) -> Result<String, RenderError> {
    debug!(
        count = events.len(),
        width = terminal.width(),
        "rendering events"
    );

    let mut lines = vec![terminal.horizontal()];

    for event in events {
        let start = event
            .start_time()
            .map_err(|source| RenderError::MalformedStart {
                title: event.title.clone(),
                source,
            })?;

        lines.extend(terminal.line(&event.title));
        lines.extend(terminal.line(&weekday_line(&start)));
        lines.push(terminal.horizontal());
    }

    let mut out = String::with_capacity(lines.len() * (terminal.width() + 1));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// `Friday    09:05`, or `Friday    all day` for all-day events.
fn weekday_line(start: &StartTime) -> String {
    let clock = start.clock().unwrap_or_else(|| "all day".to_string());
    format!(
        "{:<width$.width$}{}",
        start.weekday_name(),
        clock,
        width = WEEKDAY_FIELD_WIDTH
    )
}

#[cfg(test)]
mod tests {
    use unicode_width::UnicodeWidthStr;

    use super::*;
    use crate::event::EventStart;

    fn timed(title: &str, start: &str) -> Event {
        Event::new(title, EventStart::at(start))
    }

    /// Strips borders and padding from a content line.
    fn content(line: &str, terminal: &Terminal) -> String {
        line.chars().skip(2).take(terminal.content_width()).collect()
    }

    #[test]
    fn too_narrow_terminal_is_rejected() {
        for width in 0..=6 {
            let err = Terminal::new(width, 24).unwrap_err();
            assert!(matches!(err, RenderError::TooNarrow { width: w } if w == width));
        }
        assert!(Terminal::new(7, 24).is_ok());
    }

    #[test]
    fn horizontal_spans_full_width() {
        let terminal = Terminal::new(10, 24).unwrap();
        assert_eq!(terminal.horizontal(), "|--------|");
    }

    #[test]
    fn short_title_is_padded_to_width() {
        let terminal = Terminal::new(12, 24).unwrap();
        assert_eq!(terminal.line("abc"), vec!["| abc      |".to_string()]);
    }

    #[test]
    fn empty_title_yields_no_lines() {
        let terminal = Terminal::new(12, 24).unwrap();
        assert!(terminal.line("").is_empty());
    }

    #[test]
    fn title_wraps_at_width_40() {
        let terminal = Terminal::new(40, 24).unwrap();
        let title = "Team Sync Meetings About Q3 Planning And Budget Review";
        assert_eq!(title.chars().count(), 54);

        let lines = terminal.line(title);
        assert_eq!(lines.len(), 2);
        assert_eq!(content(&lines[0], &terminal), &title[..36]);
        assert_eq!(
            lines[1],
            format!("| {}{} |", &title[36..], " ".repeat(18))
        );
    }

    #[test]
    fn control_characters_render_as_spaces() {
        let terminal = Terminal::new(20, 24).unwrap();
        let events = vec![timed("Line one\nLine two\tx", "2024-03-15T09:05:00-04:00")];

        let out = render_events(&terminal, &events).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.chars().count() == 20));
        assert_eq!(lines[1], "| Line one Line tw |");
        assert_eq!(lines[2], "| o x              |");
    }

    #[test]
    fn wide_characters_take_two_columns() {
        let terminal = Terminal::new(12, 24).unwrap();
        let lines = terminal.line("会議会議会議会議");

        assert_eq!(
            lines,
            vec![
                "| 会議会議 |".to_string(),
                "| 会議会議 |".to_string(),
            ]
        );
        assert!(lines.iter().all(|l| l.width() == 12));

        let odd = Terminal::new(9, 24).unwrap();
        assert_eq!(odd.line("会議会"), vec!["| 会議  |".to_string(), "| 会    |".to_string()]);
    }

    #[test]
    fn wrapped_lines_reassemble_the_title() {
        let titles = [
            "x",
            "exactly eight",
            "A reasonably long meeting title that needs several lines",
            "Café sync: ünïcödé títlé wraps by character",
        ];

        for width in [7, 9, 17, 40] {
            let terminal = Terminal::new(width, 24).unwrap();
            for title in titles {
                let len = title.chars().count();
                let lines = terminal.line(title);
                assert_eq!(lines.len(), len.div_ceil(terminal.content_width()));

                let rebuilt: String = lines
                    .iter()
                    .map(|l| content(l, &terminal))
                    .collect::<String>();
                assert_eq!(rebuilt.trim_end(), title.trim_end());
                assert!(lines.iter().all(|l| l.chars().count() == width));
            }
        }
    }

    #[test]
    fn weekday_line_pads_weekday_to_ten() {
        let start = EventStart::at("2024-03-15T09:05:00-04:00").parse().unwrap();
        assert_eq!(weekday_line(&start), "Friday    09:05");
    }

    #[test]
    fn weekday_line_for_all_day_event() {
        let start = EventStart::all_day("2024-03-20").parse().unwrap();
        assert_eq!(weekday_line(&start), "Wednesday all day");
    }

    #[test]
    fn no_events_renders_only_top_border() {
        let terminal = Terminal::new(10, 24).unwrap();
        let out = render_events(&terminal, &[]).unwrap();
        assert_eq!(out, "|--------|\n");
    }

    #[test]
    fn one_separator_per_event_plus_leading() {
        let terminal = Terminal::new(30, 5).unwrap();
        let events: Vec<Event> = (0..10)
            .map(|i| timed(&format!("Event {i}"), "2024-03-15T09:05:00-04:00"))
            .collect();

        let out = render_events(&terminal, &events).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let separators = lines.iter().filter(|l| **l == terminal.horizontal()).count();

        assert_eq!(separators, 11);
        assert_eq!(lines[0], terminal.horizontal());
        assert_eq!(lines.last().copied(), Some(terminal.horizontal().as_str()));
        // Height never clips the box.
        assert_eq!(lines.len(), 1 + 10 * 3);
        assert!(lines.iter().all(|l| l.chars().count() == 30));
    }

    #[test]
    fn malformed_start_produces_no_output() {
        let terminal = Terminal::new(30, 24).unwrap();
        let events = vec![
            timed("Fine", "2024-03-15T09:05:00-04:00"),
            timed("Broken", "15/03/2024 09:05"),
        ];

        let err = render_events(&terminal, &events).unwrap_err();
        match err {
            RenderError::MalformedStart { title, .. } => assert_eq!(title, "Broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn renders_box() {
        let terminal = Terminal::new(24, 24).unwrap();
        let events = vec![
            timed("Standup", "2024-03-15T09:05:00-04:00"),
            timed("Quarterly planning with finance", "2024-03-18T14:00:00Z"),
            Event::new("Offsite", EventStart::all_day("2024-03-20")),
        ];

        let out = render_events(&terminal, &events).unwrap();
        insta::assert_snapshot!(out.trim_end(), @r"
        |----------------------|
        | Standup              |
        | Friday    09:05      |
        |----------------------|
        | Quarterly planning w |
        | ith finance          |
        | Monday    14:00      |
        |----------------------|
        | Offsite              |
        | Wednesday all day    |
        |----------------------|
        ");
    }
}
