use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::budget_form::{BudgetForm, FormField};
use crate::ui::theme;

const WIDTH: u16 = 52;

pub(crate) fn render(f: &mut Frame, area: Rect, form: &BudgetForm) {
    if !form.is_open() {
        return;
    }

    let mut lines = vec![Line::from("")];
    push_field(
        &mut lines,
        "Budget Name",
        &form.name,
        form.focus == FormField::Name,
        form.name_error(),
    );
    push_field(
        &mut lines,
        "Budget Amount",
        &form.amount,
        form.focus == FormField::Amount,
        form.amount_error(),
    );

    if let Some(err) = form.error() {
        lines.push(Line::from(Span::styled(format!(" {err}"), theme::error_style())));
        lines.push(Line::from(""));
    }

    // The submit control renders disabled while a write is in flight
    let submit_style = if form.is_submitting() {
        theme::dim_style().bg(theme::SURFACE)
    } else {
        Style::default()
            .fg(theme::HEADER_BG)
            .bg(theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    };
    let cancel_style = if form.is_submitting() {
        theme::dim_style()
    } else {
        theme::normal_style()
    };
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(" Cancel (Esc) ", cancel_style.bg(theme::OVERLAY)),
        Span::raw("  "),
        Span::styled(format!(" {} (Enter) ", form.submit_label()), submit_style),
    ]));

    let popup_area = theme::centered(area, WIDTH, lines.len() as u16 + 2);
    f.render_widget(Clear, popup_area);
    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT))
            .title(Span::styled(
                " Add New Budget ",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ))
            .style(Style::default().bg(theme::HEADER_BG)),
    );
    f.render_widget(popup, popup_area);
}

fn push_field<'a>(
    lines: &mut Vec<Line<'a>>,
    label: &'a str,
    value: &'a str,
    focused: bool,
    error: Option<&'static str>,
) {
    let label_style = if focused {
        Style::default()
            .fg(theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        theme::dim_style()
    };
    let cursor = if focused { "▏" } else { "" };
    let width = WIDTH.saturating_sub(6) as usize;

    lines.push(Line::from(Span::styled(format!(" {label}"), label_style)));
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:<width$}", format!("{value}{cursor}")),
            theme::input_style(focused),
        ),
    ]));
    match error {
        Some(msg) => lines.push(Line::from(Span::styled(format!(" {msg}"), theme::error_style()))),
        None => lines.push(Line::from("")),
    }
}
