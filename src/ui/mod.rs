mod popup;
mod pricing;
mod test_list;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{ListItem, Paragraph};
use ratatui::Frame;

use crate::app::{App, Screen};
use crate::listing::{FetchStatus, ListState};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    test_list::render(frame, app, chunks[1]);
    if app.screen == Screen::Pricing {
        pricing::render(frame, app);
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match (&app.screen, &app.pricing) {
        (Screen::Pricing, Some(pricing)) => format!("labdesk - Pricing: {}", pricing.test),
        _ => "labdesk - Tests".to_string(),
    };

    let header = Paragraph::new(Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let loading = app.tests.state().status.is_loading() || app.branches.state().status.is_loading();
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}  (r: retry)", error),
            Style::default().fg(Color::Red),
        )])
    } else if loading {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match app.screen {
            Screen::Tests => "j/k/g/G: nav | Ctrl+d/u: page | Enter: pricing | r: refresh | q: quit",
            Screen::Pricing => "b: branches | j/k/wheel: scroll | Enter: pick | r: reload | q: close",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Trailing row shown after the last record of an incremental list.
fn sentinel_row<R>(state: &ListState<'_, R>) -> ListItem<'static> {
    let (text, color) = match state.status {
        FetchStatus::InitialLoading | FetchStatus::ContinuationLoading => {
            ("Loading more...", Color::Yellow)
        }
        FetchStatus::Failed => ("Load failed, press r to retry", Color::Red),
        FetchStatus::Idle if state.snapshot.has_more() => ("", Color::DarkGray),
        FetchStatus::Idle => ("End of list", Color::DarkGray),
    };
    ListItem::new(Line::from(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::ITALIC),
    )))
}
