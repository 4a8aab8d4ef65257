use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::{app::App, history::humanize_since, history::SessionRecord};

/// Pure presenter for a single history row
pub fn present_row(record: &SessionRecord, now: DateTime<Local>) -> Row<'static> {
    let answered = record.correct_count + record.wrong_count + record.skipped_count;
    let accuracy = if answered == 0 {
        0.0
    } else {
        (record.correct_count as f64 / answered as f64 * 100.0).round()
    };

    let accuracy_color = if accuracy >= 90.0 {
        Color::Green
    } else if accuracy >= 60.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    Row::new(vec![
        Cell::from(humanize_since(record.finished_at, now)),
        Cell::from(record.difficulty.to_string()),
        Cell::from(record.tone_mode.label()),
        Cell::from(record.score.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!(
            "{}/{}/{}",
            record.correct_count, record.wrong_count, record.skipped_count
        )),
        Cell::from(format!("{accuracy:.0}%")).style(Style::default().fg(accuracy_color)),
    ])
}

pub fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Instructions
        ])
        .split(area);

    Paragraph::new("Recent sessions")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[0], buf);

    if app.history_rows.is_empty() {
        Paragraph::new("No finished sessions yet")
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    } else {
        let now = Local::now();
        let header = Row::new(vec!["When", "Tier", "Tones", "Score", "C/W/S", "Acc"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = app
            .history_rows
            .iter()
            .map(|r| present_row(r, now))
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(18),
                Constraint::Length(8),
                Constraint::Length(11),
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[1], buf);
    }

    Paragraph::new("(b)ack / (r)etry / (esc)ape")
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{Difficulty, ToneMode};
    use chrono::Duration;

    fn record(correct: u32, wrong: u32, skipped: u32) -> SessionRecord {
        SessionRecord {
            id: 1,
            difficulty: Difficulty::Hard,
            tone_mode: ToneMode::Toneless,
            score: 120,
            correct_count: correct,
            wrong_count: wrong,
            skipped_count: skipped,
            finished_at: Local::now() - Duration::hours(3),
        }
    }

    #[test]
    fn test_present_row_builds_all_columns() {
        // Row does not expose its cells; building it must simply not panic
        let _ = present_row(&record(9, 1, 0), Local::now());
        let _ = present_row(&record(0, 0, 0), Local::now());
    }

    #[test]
    fn test_render_history_with_rows() {
        use crate::app::{AppState, DrillSettings};
        use crate::deck::{DeckEntry, DeckSet};
        use ratatui::{backend::TestBackend, Terminal};

        let decks = DeckSet {
            easy: vec![DeckEntry::new("愛", "ài")],
            medium: vec![DeckEntry::new("你好", "nǐ hǎo")],
            hard: vec![DeckEntry::new("太貴了。", "tài guì le.")],
        };
        let mut app = App::new(DrillSettings::default(), decks, None);
        app.state = AppState::History;
        app.history_rows = vec![record(3, 1, 1)];

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Recent sessions"));
        assert!(content.contains("hard"));
        assert!(content.contains("3/1/1"));
    }
}
