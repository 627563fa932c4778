use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame,
};

use crate::api::VoteChoice;
use crate::app::{App, Popup};
use crate::display::ChoiceRow;
use crate::status::Severity;
use crate::theme::Theme;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme before the first draw; later calls are ignored
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }

fn choice_color(choice: VoteChoice) -> Color {
    match choice {
        VoteChoice::Dogs => theme().dogs,
        VoteChoice::Cats => theme().cats,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => text_dim(),
        Severity::Success => theme().success,
        Severity::Warning => theme().warning,
        Severity::Error => theme().danger,
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Endpoint line
            Constraint::Min(8),     // Results box
            Constraint::Length(3),  // Vote buttons
            Constraint::Length(1),  // Status line
            Constraint::Length(1),  // Error line
            Constraint::Length(1),  // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_results_box(f, app, chunks[1]);
    draw_vote_box(f, app, chunks[2]);
    draw_status_line(f, app, chunks[3]);
    draw_error_line(f, app, chunks[4]);
    draw_footer(f, chunks[5]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled("pawpoll", Style::default().fg(accent()).add_modifier(Modifier::BOLD)),
        Span::styled(" │ ", Style::default().fg(inactive())),
        Span::styled(app.api_url(), Style::default().fg(text_dim())),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_results_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Results ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(display) = &app.display else {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Waiting for results...",
            Style::default().fg(text_dim()),
        )))
        .alignment(Alignment::Center);
        f.render_widget(waiting, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    for (i, row) in display.rows.iter().enumerate() {
        draw_choice(f, row, rows[i * 2], rows[i * 2 + 1]);
    }

    let summary = Line::from(vec![
        Span::styled("Total votes: ", Style::default().fg(text_dim())),
        Span::styled(display.total.to_string(), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
        Span::styled("  │  ", Style::default().fg(inactive())),
        Span::styled("Last update: ", Style::default().fg(text_dim())),
        Span::styled(display.updated_at.as_str(), Style::default().fg(text())),
    ]);
    f.render_widget(Paragraph::new(summary).alignment(Alignment::Center), rows[4]);
}

fn draw_choice(f: &mut Frame, row: &ChoiceRow, label_area: Rect, bar_area: Rect) {
    let color = choice_color(row.choice);
    let label = Line::from(vec![
        Span::styled(format!(" {:<6}", row.choice.label()), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{:>6} votes  ", row.count), Style::default().fg(text())),
        Span::styled(row.percent_text(), Style::default().fg(color)),
    ]);
    f.render_widget(Paragraph::new(label), label_area);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Reset))
        .ratio(row.ratio())
        .label("");
    f.render_widget(gauge, bar_area);
}

fn draw_vote_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Vote ", Style::default().fg(inactive())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let mut spans = Vec::new();
    for (i, choice) in VoteChoice::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("    "));
        }
        let style = if *choice == app.selected {
            Style::default().fg(Color::Black).bg(choice_color(*choice)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(choice_color(*choice))
        };
        spans.push(Span::styled(format!("[ {} ]", choice.label()), style));
    }

    let buttons = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(buttons, area);
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = app.status.status_line() {
        let line = Line::from(Span::styled(
            status.text.as_str(),
            Style::default().fg(severity_color(status.severity)),
        ));
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }
}

fn draw_error_line(f: &mut Frame, app: &App, area: Rect) {
    if let Some(error) = app.status.error_line() {
        let line = Line::from(Span::styled(
            error.text.as_str(),
            Style::default().fg(severity_color(Severity::Error)).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = [
        ("←→", "Select"),
        ("Enter", "Vote"),
        ("d/c", "Dogs/Cats"),
        ("r", "Refresh"),
        ("?", "Help"),
        ("q", "Quit"),
    ];

    // Narrow terminals get fewer hints
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let mut spans = Vec::new();
    for (i, (key, desc)) in hints.iter().take(max_hints).enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", Style::default()));
        }
        spans.push(Span::styled(*key, Style::default().fg(accent())));
        spans.push(Span::styled(format!(" {}", desc), Style::default().fg(text_dim())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 90 } else { 60 }, 70, area);

    f.render_widget(Clear, popup_area);

    let key_line = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(desc),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("═══ Voting ═══", Style::default().fg(accent()).add_modifier(Modifier::BOLD))),
        key_line("←/→ Tab", "Switch the highlighted choice"),
        key_line("Enter", "Vote for the highlighted choice"),
        key_line("d / 1", "Vote for dogs"),
        key_line("c / 2", "Vote for cats"),
        Line::from(""),
        Line::from(Span::styled("═══ Results ═══", Style::default().fg(accent()).add_modifier(Modifier::BOLD))),
        key_line("r", "Refresh now (results also poll automatically)"),
        Line::from(""),
        Line::from(Span::styled("═══ CLI ═══", Style::default().fg(accent()).add_modifier(Modifier::BOLD))),
        key_line("--vote", "Cast one vote and print results"),
        key_line("--results", "Print results as JSON"),
        key_line("--health", "Check the backend"),
        Line::from(""),
        key_line("q", "Quit"),
    ];

    let help = Paragraph::new(help_text).block(
        Block::default()
            .title(Span::styled(" Help ", Style::default().fg(accent())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
