use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::sentinel_row;
use crate::app::App;
use crate::listing::FetchStatus;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.tests.state();
    let tests = state.snapshot.items();

    if state.snapshot.is_empty() && state.status != FetchStatus::InitialLoading {
        let block = Block::default().borders(Borders::ALL).title("Tests");
        let empty = Paragraph::new("No tests found")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 52; // name(36) + space(1) + code(8) + space(1) + price(6)
    let flex = w.saturating_sub(fixed).max(10);

    let mut items: Vec<ListItem> = tests
        .iter()
        .enumerate()
        .map(|(i, test)| {
            let style = if i == app.tests_view.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let name = if test.name.chars().count() > 36 {
                format!("{}...", test.name.chars().take(33).collect::<String>())
            } else {
                test.name.clone()
            };
            let price = test
                .price
                .map(|p| format!("{:>6.0}", p))
                .unwrap_or_else(|| "     -".to_string());
            let description = test
                .description
                .as_deref()
                .map(|d| d.chars().take(flex).collect::<String>())
                .unwrap_or_default();

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<36}", name), style),
                Span::raw(" "),
                Span::styled(
                    format!("{:<8}", test.code.as_deref().unwrap_or("")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(price, Style::default().fg(Color::Green)),
                Span::raw("  "),
                Span::styled(description, Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();
    items.push(sentinel_row(&state));

    let more = if state.snapshot.has_more() { "+" } else { "" };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Tests ({}{}, page {})", tests.len(), more, state.page)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut list_state = ListState::default()
        .with_offset(app.tests_view.offset)
        .with_selected(Some(app.tests_view.selected));

    frame.render_stateful_widget(list, area, &mut list_state);
}
