use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

/// Header block height: title row, greeting, subtitle, plus borders.
pub(crate) const HEADER_HEIGHT: u16 = 4;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let session = app.session.state();
    if app.dashboard.is_loading(session) {
        render_loading(f, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(3)])
        .split(area);

    let name = session.greeting_name().unwrap_or("there");
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Welcome, {name}!"),
            theme::normal_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("Here are your budgets.", theme::dim_style())),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Dashboard ", theme::header_style())),
    );
    f.render_widget(header, chunks[0]);

    if app.dashboard.budgets().is_empty() {
        render_empty(f, chunks[1]);
        return;
    }

    let name_width = (chunks[1].width as usize).saturating_sub(24).clamp(8, 40);
    let items: Vec<ListItem> = app
        .dashboard
        .budgets()
        .iter()
        .enumerate()
        .skip(app.dashboard.scroll)
        .take(chunks[1].height.saturating_sub(2) as usize)
        .map(|(i, budget)| {
            let selected = i == app.dashboard.index;
            let style = if selected {
                theme::selected_style()
            } else if i % 2 == 0 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let amount_style = if selected {
                style
            } else {
                theme::amount_style()
            };

            let display_name = truncate(&budget.name, name_width);
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" {display_name:<name_width$} "),
                    style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("Amount: {} ", format_amount(budget.amount)),
                    amount_style,
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Budgets ({}) ", app.dashboard.budgets().len()),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(list, chunks[1]);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("Loading...", theme::dim_style())),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY)),
    );
    f.render_widget(msg, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No budgets found. Add one to get started!",
            theme::dim_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press a or use :budget <name> <amount>",
            theme::dim_style(),
        )),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Budgets ",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(msg, area);
}
