use ratatui::style::{Color, Modifier, Style};

use crate::app::NoticeKind;

pub struct Theme {
    pub focus_border: Color,
    pub blurred_border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub selection_fg: Color,

    // Specific components
    pub tab_highlight: Style,
    pub field_label: Style,
    pub field_focused: Style,
    pub poll_title: Style,
    pub poll_caption: Style,
    pub status_active: Style,
    pub status_completed: Style,
    pub status_archived: Style,
    pub bar: Style,
    pub footer: Style,
    pub notice_success: Style,
    pub notice_error: Style,
    pub notice_info: Style,
    pub popup_border: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_border: Color::Cyan,
            blurred_border: Color::DarkGray,
            text: Color::White,
            text_secondary: Color::Gray,
            selection_fg: Color::Yellow,

            tab_highlight: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            field_label: Style::default().fg(Color::Gray),
            field_focused: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            poll_title: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            poll_caption: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            status_active: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            status_completed: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            status_archived: Style::default().fg(Color::DarkGray),
            bar: Style::default().fg(Color::Cyan),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            notice_success: Style::default().fg(Color::Green),
            notice_error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            notice_info: Style::default().fg(Color::Cyan),
            popup_border: Style::default().fg(Color::Magenta).bg(Color::Black),
        }
    }
}

impl Theme {
    pub fn status(&self, status: Option<&str>) -> Style {
        match status.unwrap_or("").to_uppercase().as_str() {
            "COMPLETED" => self.status_completed,
            "ARCHIVED" => self.status_archived,
            "" => Style::default().fg(self.text_secondary),
            _ => self.status_active,
        }
    }

    pub fn notice(&self, kind: NoticeKind) -> Style {
        match kind {
            NoticeKind::Success => self.notice_success,
            NoticeKind::Error => self.notice_error,
            NoticeKind::Info => self.notice_info,
        }
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focus_border).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.blurred_border)
        }
    }
}
