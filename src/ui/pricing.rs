use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::popup::centered_rect;
use super::sentinel_row;
use crate::app::{App, DROPDOWN_ROWS};

/// Render the pricing modal with its branch dropdown
pub fn render(frame: &mut Frame, app: &App) {
    let Some(pricing) = &app.pricing else {
        return;
    };

    let height = (DROPDOWN_ROWS + 8) as u16;
    let area = centered_rect(60, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" Pricing: {} ", pricing.test.name),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let base = pricing
        .test
        .price
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "not set".to_string());
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Base price: ", Style::default().fg(Color::Gray)),
            Span::raw(base),
        ])),
        chunks[0],
    );

    let branch = pricing
        .branch
        .as_ref()
        .map(|b| b.to_string())
        .unwrap_or_else(|| "select a branch".to_string());
    let arrow = if pricing.dropdown_open { "▲" } else { "▼" };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Branch: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} {}", branch, arrow),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])),
        chunks[1],
    );

    if !pricing.dropdown_open {
        return;
    }

    let state = app.branches.state();
    let mut items: Vec<ListItem> = state
        .snapshot
        .items()
        .iter()
        .enumerate()
        .map(|(i, branch)| {
            let style = if i == pricing.dropdown.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let prefix = if i == pricing.dropdown.selected { "> " } else { "  " };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}", prefix, branch),
                style,
            )))
        })
        .collect();
    items.push(sentinel_row(&state));

    let dropdown = List::new(items).block(Block::default().borders(Borders::ALL));
    let mut list_state = ListState::default()
        .with_offset(pricing.dropdown.offset)
        .with_selected(Some(pricing.dropdown.selected));

    let area = chunks[2];
    let area = ratatui::layout::Rect {
        height: area.height.min(DROPDOWN_ROWS as u16 + 2),
        ..area
    };
    frame.render_stateful_widget(dropdown, area, &mut list_state);
}
