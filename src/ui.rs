use ratatui::{
    prelude::*,
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs,
        Wrap,
    },
    symbols,
};

use crate::app::{App, FormField, Tab};
use crate::config_panel::{self, Section};
use crate::detail::{NO_VOTES, vote_table};
use crate::models::PollDetail;
use crate::polls::NO_POLLS;
use crate::theme::Theme;
use crate::utils::{centered_rect, compact, format_timestamp, pretty};

/// Draws the whole panel.
pub fn render(f: &mut Frame, app: &App, theme: &Theme) {
    let notice_height = match &app.notice {
        Some(n) if n.details.is_some() => 10,
        Some(_) => 3,
        None => 0,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(notice_height),
            Constraint::Length(3),
        ])
        .split(f.area());

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .block(Block::default().borders(Borders::ALL).title("Poll Manager"))
        .style(Style::default().fg(theme.text))
        .highlight_style(theme.tab_highlight)
        .select(app.tab.as_index())
        .divider(symbols::DOT)
        .padding(" ", " ");
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Dispatch => render_dispatch(f, chunks[1], app, theme),
        Tab::Manage => render_manage(f, chunks[1], app, theme),
        Tab::Configuration => render_config(f, chunks[1], app, theme),
    }

    if let Some(notice) = &app.notice {
        let mut lines = vec![Line::from(Span::styled(notice.text.clone(), theme.notice(notice.kind)))];
        if let Some(details) = &notice.details {
            lines.extend(pretty(details).lines().map(|l| Line::from(l.to_string())));
        }
        let para = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).border_style(theme.notice(notice.kind)))
            .wrap(Wrap { trim: false });
        f.render_widget(para, chunks[2]);
    }

    let footer = Paragraph::new(footer_text(app))
        .block(Block::default().borders(Borders::ALL))
        .style(theme.footer);
    f.render_widget(footer, chunks[3]);

    if let Some(id) = &app.confirm_delete {
        let area = centered_rect(50, 20, f.area());
        f.render_widget(Clear, area);
        let para = Paragraph::new(format!("Delete poll {}?\n\ny = delete, any other key = cancel", id))
            .block(Block::default().title("Confirm").borders(Borders::ALL).style(theme.popup_border))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(para, area);
    }
}

fn footer_text(app: &App) -> String {
    match app.tab {
        Tab::Dispatch => "Tab Switch tab | ↑/↓ Field | ←/→ Adjust number | Enter Dispatch Poll | Esc Clear message | Ctrl+C Quit".into(),
        Tab::Manage => {
            let mut hints = vec!["Tab Switch tab", "↑/↓ Select", "r Refresh", "Enter View results", "a Archive"];
            if app.highlighted_poll().is_some_and(|p| p.can_complete()) {
                hints.push("c Mark as Completed");
            }
            hints.push("d Delete");
            if app.navigation_offered() {
                hints.push("←/→ Page");
            }
            if app.session.list.selected().is_some() {
                hints.push("t Raw responses");
            }
            hints.extend(["y Copy ID", "q Quit"]);
            hints.join(" | ")
        }
        Tab::Configuration => {
            if app.config_panel.editing.is_some() {
                "Enter Save | Esc Cancel".into()
            } else {
                "Tab Switch tab | ↑/↓ Select | Enter Edit | q Quit".into()
            }
        }
    }
}

fn render_dispatch(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut constraints: Vec<Constraint> = FormField::ALL.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in FormField::ALL.iter().enumerate() {
        let focused = *field == app.form_field;
        let mut value = app.draft_field_value(*field);
        if focused {
            value.push(if field.is_numeric() { ' ' } else { '▏' });
        }
        let title = Span::styled(
            field.label(),
            if focused { theme.field_focused } else { theme.field_label },
        );
        let para = Paragraph::new(value)
            .style(Style::default().fg(theme.text))
            .block(Block::default().title(title).borders(Borders::ALL).border_style(theme.border(focused)));
        f.render_widget(para, rows[i]);
    }

    let help = Paragraph::new(
        "Poll will automatically be marked 'COMPLETED' after the duration. Press Enter to dispatch.",
    )
    .style(Style::default().fg(theme.text_secondary))
    .wrap(Wrap { trim: true });
    f.render_widget(help, rows[FormField::ALL.len()]);
}

fn render_manage(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(page) = app.session.list.cache.get() else {
        f.render_widget(Paragraph::new("Loading polls...").block(Block::default().borders(Borders::ALL)), area);
        return;
    };

    if page.is_empty() {
        let para = Paragraph::new(NO_POLLS)
            .style(theme.notice_info)
            .block(Block::default().title("Managed Polls").borders(Borders::ALL));
        f.render_widget(para, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);
    let summary = format!(
        "Displaying {} of {} polls. Page {}/{}",
        page.items.len(),
        page.total_items,
        app.session.list.page(),
        page.total_pages
    );
    f.render_widget(Paragraph::new(summary).style(Style::default().fg(theme.text_secondary)), chunks[0]);

    let has_detail = app.detail.is_some();
    let columns = if has_detail {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1)])
            .split(chunks[1])
    };

    let items: Vec<ListItem> = page
        .items
        .iter()
        .map(|poll| {
            let selected = app.session.list.selected() == Some(poll.internal_poll_group_id.as_str());
            let marker = if selected { "● " } else { "  " };
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(poll.name.clone().unwrap_or_else(|| "N/A".into()), theme.poll_title),
                    Span::raw(format!(" (ID: {}, Status: ", poll.internal_poll_group_id)),
                    Span::styled(
                        poll.status.clone().unwrap_or_else(|| "N/A".into()),
                        theme.status(poll.status.as_deref()),
                    ),
                    Span::raw(")"),
                ]),
                Line::from(Span::styled(
                    format!(
                        "    Created: {}, Expires: {}",
                        format_timestamp(poll.created_at.as_deref()),
                        format_timestamp(poll.expires_at.as_deref())
                    ),
                    theme.poll_caption,
                )),
                Line::from(Span::styled(
                    format!("    Choices: {}, Options: {}", compact(&poll.choices), compact(&poll.options)),
                    theme.poll_caption,
                )),
            ])
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(app.cursor));
    let list = List::new(items)
        .block(Block::default().title("Managed Polls").borders(Borders::ALL).border_style(theme.border(true)))
        .highlight_style(Style::default().fg(theme.selection_fg))
        .highlight_symbol("→");
    f.render_stateful_widget(list, columns[0], &mut state);

    if has_detail {
        render_detail(f, columns[1], app, theme);
    }
}

fn render_detail(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let id = app.session.list.selected().unwrap_or_default();
    let block = Block::default()
        .title(format!("Details for Poll ID: {}", id))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    match &app.detail {
        Some(Ok(detail)) => {
            let inner = block.inner(area);
            f.render_widget(block, area);
            render_results(f, inner, app, detail, theme);
        }
        Some(Err(err)) => {
            let mut lines = vec![Line::from(Span::styled(err.to_string(), theme.notice_error))];
            if let Some(details) = err.details() {
                lines.extend(pretty(details).lines().map(|l| Line::from(l.to_string())));
            }
            let para = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((app.detail_scroll, 0));
            f.render_widget(para, area);
        }
        None => {}
    }
}

fn render_results(f: &mut Frame, area: Rect, app: &App, detail: &PollDetail, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    let def = &detail.definition;
    let info = vec![
        Line::from(vec![
            Span::styled("Name: ", theme.field_label),
            Span::styled(def.name.clone().unwrap_or_else(|| "N/A".into()), theme.poll_title),
        ]),
        Line::from(vec![
            Span::styled("Status: ", theme.field_label),
            Span::styled(
                detail.status.clone().unwrap_or_else(|| "N/A".into()),
                theme.status(detail.status.as_deref()),
            ),
        ]),
        Line::from(Span::styled(
            format!("Expires: {}", format_timestamp(def.expires_at.as_deref())),
            theme.poll_caption,
        )),
        Line::from(format!("Choices: {}", compact(&def.choices))),
        Line::from(format!("Options: {}", compact(&def.options))),
        Line::from(format!("Total Responses Recorded: {}", detail.total_responses)),
    ];
    f.render_widget(Paragraph::new(info).wrap(Wrap { trim: true }), chunks[0]);

    let rows = vote_table(detail);
    if rows.is_empty() {
        f.render_widget(Paragraph::new(NO_VOTES).style(theme.notice_info), chunks[1]);
    } else {
        let bars: Vec<Bar> = rows
            .iter()
            .map(|r| Bar::default().value(r.votes).label(Line::from(r.option.clone())))
            .collect();
        let chart = BarChart::default()
            .block(Block::default().title("Votes").borders(Borders::ALL))
            .bar_width(7)
            .bar_gap(2)
            .bar_style(theme.bar)
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .data(BarGroup::default().bars(&bars));
        f.render_widget(chart, chunks[1]);
    }

    let bottom = if app.raw.is_some() {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[2])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1)])
            .split(chunks[2])
    };

    if !rows.is_empty() {
        let table_rows = rows
            .iter()
            .map(|r| Row::new(vec![r.option.clone(), r.votes.to_string()]));
        let table = Table::new(table_rows, [Constraint::Percentage(70), Constraint::Percentage(30)])
            .header(Row::new(vec!["Option", "Votes"]).style(theme.field_focused))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(table, bottom[0]);
    }

    if let Some(raw) = &app.raw {
        let text = match raw {
            Ok(value) => pretty(value),
            Err(err) => err.to_string(),
        };
        let para = Paragraph::new(text)
            .block(Block::default().title("Raw Responses Data").borders(Borders::ALL))
            .wrap(Wrap { trim: false })
            .scroll((app.detail_scroll, 0));
        f.render_widget(para, bottom[bottom.len() - 1]);
    }
}

fn render_config(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);
    f.render_widget(
        Paragraph::new("Modify action parameters. These are persisted in your pollpanel config.")
            .style(theme.notice_info),
        chunks[0],
    );

    let entries = config_panel::entries(&app.settings);
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let section = match entry.section {
                Section::Connection => "connection",
                Section::Action => "action",
            };
            let value = match (&app.config_panel.editing, i == app.config_panel.selected) {
                (Some(buffer), true) => format!("{}▏", buffer),
                _ => entry.display.clone(),
            };
            let lock = if entry.editable { "" } else { " 🔒" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", section), theme.poll_caption),
                Span::styled(format!("{}{}: ", entry.key, lock), theme.field_label),
                Span::styled(value, Style::default().fg(theme.text)),
            ]))
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(app.config_panel.selected));
    let list = List::new(items)
        .block(Block::default().title("Poll Manager Configuration").borders(Borders::ALL))
        .highlight_style(Style::default().fg(theme.selection_fg))
        .highlight_symbol("→");
    f.render_stateful_widget(list, chunks[1], &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Notice;
    use crate::config::Settings;
    use crate::network::testing::FakeGateway;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn app() -> App {
        let mut action = BTreeMap::new();
        action.insert("whatsapp_action".to_string(), "WPPConnectAction".to_string());
        App::new(
            Settings {
                base_url: "http://localhost:8000".into(),
                walker_endpoint: "/action/walker".into(),
                agent_id: "agent-1".into(),
                module_root: "actions/poll".into(),
                api_token: None,
                page_limit: 10,
                log_file: None,
                action,
            },
            None,
        )
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 50)).unwrap();
        terminal.draw(|f| render(f, app, &Theme::default())).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[tokio::test]
    async fn empty_list_shows_message_and_no_paging() {
        let gateway = FakeGateway::new().reply(json!({"items": [], "total_pages": 1, "total_items": 0}));
        let mut app = app();
        app.tab = Tab::Manage;
        app.sync(&gateway).await;

        let screen = draw(&app);
        assert!(screen.contains("No polls managed"));
        assert!(!screen.contains("Page 1/1"));
        assert!(!screen.contains("←/→ Page"));
    }

    #[tokio::test]
    async fn details_render_vote_rows() {
        let gateway = FakeGateway::new()
            .reply(json!({
                "items": [{"internal_poll_group_id": "g1", "name": "Lunch?", "status": "ACTIVE"}],
                "total_pages": 1,
                "total_items": 1,
            }))
            .reply(json!({
                "definition": {"name": "Lunch?", "choices": ["Pizza", "Sushi"]},
                "status": "ACTIVE",
                "total_responses": 4,
                "counts": {"Pizza": 3, "Sushi": 1},
            }));
        let mut app = app();
        app.tab = Tab::Manage;
        app.sync(&gateway).await;
        app.view_highlighted();
        app.sync(&gateway).await;

        let screen = draw(&app);
        assert!(screen.contains("Displaying 1 of 1 polls. Page 1/1"));
        assert!(screen.contains("Details for Poll ID: g1"));
        assert!(screen.contains("Total Responses Recorded: 4"));
        assert!(screen.contains("c Mark as Completed"));
    }

    #[test]
    fn masked_action_values_never_reach_the_screen() {
        let mut app = app();
        app.tab = Tab::Configuration;
        let screen = draw(&app);
        assert!(screen.contains("whatsapp_action"));
        assert!(!screen.contains("WPPConnectAction"));
    }

    #[test]
    fn notice_details_are_pretty_printed() {
        let mut app = app();
        app.notice = Some(Notice {
            kind: crate::app::NoticeKind::Error,
            text: "Failed to dispatch poll: offline".into(),
            details: Some(json!({"session": "+1555"})),
        });
        let screen = draw(&app);
        assert!(screen.contains("Failed to dispatch poll: offline"));
        assert!(screen.contains("\"session\": \"+1555\""));
    }
}
