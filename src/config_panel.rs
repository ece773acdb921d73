use crate::config::Settings;

/// Action parameters shown masked and locked in the Configuration tab.
pub const MASKED_FIELDS: &[&str] = &["whatsapp_action"];
/// Action parameters not shown at all.
pub const HIDDEN_FIELDS: &[&str] = &[];

const MASK: &str = "••••••••";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Connection,
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub section: Section,
    pub key: String,
    pub display: String,
    pub editable: bool,
}

/// Connection settings (read-only) followed by the action parameters.
pub fn entries(settings: &Settings) -> Vec<ConfigEntry> {
    let connection = [
        ("base_url", settings.base_url.clone()),
        ("walker_endpoint", settings.walker_endpoint.clone()),
        ("agent_id", settings.agent_id.clone()),
        ("module_root", settings.module_root.clone()),
        ("page_limit", settings.page_limit.to_string()),
    ];
    let mut out: Vec<ConfigEntry> = connection
        .into_iter()
        .map(|(key, value)| ConfigEntry {
            section: Section::Connection,
            key: key.to_string(),
            display: value,
            editable: false,
        })
        .collect();

    let token = settings.api_token.as_deref().unwrap_or("");
    out.push(ConfigEntry {
        section: Section::Connection,
        key: "api_token".to_string(),
        display: if token.is_empty() { "(not set)".into() } else { MASK.into() },
        editable: false,
    });

    for (key, value) in &settings.action {
        if HIDDEN_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let masked = MASKED_FIELDS.contains(&key.as_str());
        out.push(ConfigEntry {
            section: Section::Action,
            key: key.clone(),
            display: if masked { MASK.to_string() } else { value.clone() },
            editable: !masked,
        });
    }
    out
}

/// Cursor and in-progress edit of the Configuration tab.
#[derive(Debug, Default)]
pub struct ConfigPanel {
    pub selected: usize,
    pub editing: Option<String>,
}

impl ConfigPanel {
    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// Starts editing the selected entry. Returns false for locked entries.
    pub fn begin_edit(&mut self, settings: &Settings) -> bool {
        let Some(entry) = entries(settings).into_iter().nth(self.selected) else {
            return false;
        };
        if !entry.editable {
            return false;
        }
        self.editing = Some(settings.action.get(&entry.key).cloned().unwrap_or_default());
        true
    }

    /// Finishes the edit, writing the value into `settings`. Returns the key and
    /// new value so the caller can persist them.
    pub fn commit(&mut self, settings: &mut Settings) -> Option<(String, String)> {
        let value = self.editing.take()?;
        let entry = entries(settings).into_iter().nth(self.selected)?;
        if !entry.editable {
            return None;
        }
        settings.action.insert(entry.key.clone(), value.clone());
        Some((entry.key, value))
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }
}
