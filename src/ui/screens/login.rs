use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::login::{LoginField, LoginForm};
use crate::ui::theme;

pub(crate) fn render(f: &mut Frame, area: Rect, form: &LoginForm) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Sign in to see your budgets.",
            theme::normal_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "A new account is created on first sign-in.",
            theme::dim_style(),
        )),
        Line::from(""),
    ];

    for (field, label, value) in [
        (LoginField::Email, "Email", form.email.as_str()),
        (
            LoginField::DisplayName,
            "Display name (optional)",
            form.display_name.as_str(),
        ),
    ] {
        let focused = form.focus == field;
        let label_style = if focused {
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            theme::dim_style()
        };
        let cursor = if focused { "▏" } else { "" };
        lines.push(Line::from(Span::styled(format!(" {label}"), label_style)));
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!("{:<40}", format!("{value}{cursor}")),
                theme::input_style(focused),
            ),
        ]));
        lines.push(Line::from(""));
    }

    if let Some(err) = form.error() {
        lines.push(Line::from(Span::styled(format!(" {err}"), theme::error_style())));
    }

    let popup_area = theme::centered(area, 50, lines.len() as u16 + 2);
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Sign In ", theme::header_style())),
    );
    f.render_widget(panel, popup_area);
}
