pub mod history;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, AppState},
    deck::Card,
    session::{CardState, Outcome, SessionSummary},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// m:ss countdown label
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// "prompt answer" pairs for a results group
pub fn format_card_list(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| format!("{} {}", c.prompt, c.display_answer))
        .join("   ")
}

fn outcome_style(outcome: Outcome) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match outcome {
        Outcome::Correct => bold.fg(Color::Green),
        Outcome::Wrong => bold.fg(Color::Red),
        Outcome::Skipped => bold.fg(Color::Yellow),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Drill => render_drill(self, area, buf),
            AppState::Results => {
                if let Some(summary) = self.summary.as_ref() {
                    render_results(self, summary, area, buf)
                }
            }
            AppState::History => history::render_history(self, area, buf),
        }
    }
}

fn render_drill(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let Some(card) = session.current_card() else {
        Paragraph::new("no cards in this deck")
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let prompt_lines = {
        let usable = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
        card.prompt.width().div_ceil(usable).max(1) as u16
    };
    let filler = area.height.saturating_sub(prompt_lines + 7) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Length(filler),
            Constraint::Length(1), // timer
            Constraint::Length(1),
            Constraint::Length(prompt_lines),
            Constraint::Length(1),
            Constraint::Length(1), // input
            Constraint::Length(1), // reveal
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (position, total) = session.progress();
    let status = Paragraph::new(Line::from(vec![
        Span::styled(session.difficulty().to_string(), bold_style),
        Span::styled(format!(" · {}", session.tone_mode().label()), dim_style),
        Span::raw(format!("   {position}/{total}")),
        Span::styled(format!("   score {}", session.score()), bold_style),
    ]))
    .alignment(Alignment::Center);
    status.render(chunks[0], buf);

    let timer_style = if session.seconds_remaining() <= 10 {
        bold_style.fg(Color::Red)
    } else {
        dim_style.add_modifier(Modifier::BOLD)
    };
    Paragraph::new(Span::styled(format_clock(session.seconds_remaining()), timer_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(card.prompt.clone(), bold_style.fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);

    let input_style = match session.last_outcome() {
        Some(outcome) => outcome_style(outcome),
        None => bold_style,
    };
    let mut input_spans = vec![
        Span::styled("> ", dim_style),
        Span::styled(app.input.clone(), input_style),
    ];
    if session.card_state() == CardState::Unanswered {
        input_spans.push(Span::styled(
            "_",
            dim_style.add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    Paragraph::new(Line::from(input_spans))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    if session.card_state() == CardState::Judged {
        let reveal = if card.has_distinct_display() {
            format!("{} ({})", card.answer, card.display_answer)
        } else {
            card.display_answer.clone()
        };
        Paragraph::new(Span::styled(reveal, bold_style.fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);
    }

    let legend = match session.card_state() {
        CardState::Unanswered => "(enter) submit / (tab) skip / (↑) hint / (esc)ape",
        CardState::Judged => "(enter) next / (esc)ape",
    };
    Paragraph::new(Span::styled(legend, italic_style)).render(chunks[9], buf);
}

fn render_results(app: &App, summary: &SessionSummary, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score
            Constraint::Length(1), // counters
            Constraint::Length(1), // mode
            Constraint::Length(1), // records
            Constraint::Length(1),
            Constraint::Min(1), // grouped cards
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("{} points", summary.score),
        bold_style.fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} correct", summary.correct_count), outcome_style(Outcome::Correct)),
        Span::raw("   "),
        Span::styled(format!("{} wrong", summary.wrong_count), outcome_style(Outcome::Wrong)),
        Span::raw("   "),
        Span::styled(format!("{} skipped", summary.skipped_count), outcome_style(Outcome::Skipped)),
        Span::raw(format!("   {}% acc", summary.accuracy())),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(format!(
        "{} · {}",
        summary.difficulty,
        summary.tone_mode.label()
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let records = match (app.records.today, app.records.all_time) {
        (Some(today), Some(best)) => format!("today's best {today}   all-time best {best}"),
        (None, Some(best)) => format!("all-time best {best}"),
        _ => String::new(),
    };
    Paragraph::new(Span::styled(
        records,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let mut lines = vec![];
    let groups = [
        ("correct", &summary.correct, Outcome::Correct),
        ("wrong", &summary.wrong, Outcome::Wrong),
        ("skipped", &summary.skipped, Outcome::Skipped),
    ];
    for (title, cards, outcome) in groups {
        if cards.is_empty() {
            continue;
        }
        lines.push(Line::from(Span::styled(title, outcome_style(outcome))));
        lines.push(Line::from(format_card_list(cards)));
        lines.push(Line::from(""));
    }
    if lines.is_empty() {
        lines.push(Line::from("no cards were answered"));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    let legend = if app.has_history() {
        "(r)etry / (h)istory / (esc)ape"
    } else {
        "(r)etry / (esc)ape"
    };
    Paragraph::new(Span::styled(legend, italic_style)).render(chunks[6], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::DrillSettings;
    use crate::deck::{DeckEntry, DeckSet};
    use crate::difficulty::{Difficulty, ToneMode};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::{Duration, Instant};

    fn decks() -> DeckSet {
        DeckSet {
            easy: vec![DeckEntry::new("愛", "ài").with_toneless("ai")],
            medium: vec![DeckEntry::new("你好", "nǐ hǎo")],
            hard: vec![DeckEntry::new("太貴了。", "tài guì le.")],
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(360), "6:00");
        assert_eq!(format_clock(90), "1:30");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn test_format_card_list() {
        let cards = vec![
            Card {
                prompt: "愛".into(),
                answer: "ai".into(),
                display_answer: "ài".into(),
            },
            Card {
                prompt: "八".into(),
                answer: "ba".into(),
                display_answer: "bā".into(),
            },
        ];
        assert_eq!(format_card_list(&cards), "愛 ài   八 bā");
        assert_eq!(format_card_list(&[]), "");
    }

    #[test]
    fn test_render_drill_screen() {
        let settings = DrillSettings {
            difficulty: Difficulty::Easy,
            tone_mode: ToneMode::Toneless,
            save_history: false,
        };
        let app = App::new(settings, decks(), None);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();

        let content = buffer_text(&terminal);
        assert!(content.contains("6:00"));
        assert!(content.contains("score"));
        assert!(content.contains("submit"));
    }

    #[test]
    fn test_render_results_screen() {
        let settings = DrillSettings {
            difficulty: Difficulty::Medium,
            tone_mode: ToneMode::Toned,
            save_history: false,
        };
        let start = Instant::now();
        let mut app = App::new(settings, decks(), None);
        app.restart(start);
        app.on_tick(start + Duration::from_secs(90));
        assert_eq!(app.state, AppState::Results);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();

        let content = buffer_text(&terminal);
        assert!(content.contains("points"));
        assert!(content.contains("(r)etry"));
    }

    #[test]
    fn test_render_tiny_terminal_does_not_panic() {
        let app = App::new(DrillSettings::default(), decks(), None);

        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();
    }
}
