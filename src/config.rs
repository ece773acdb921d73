use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Defaults shipped with the binary. Also used to seed the user config.
pub const BLUEPRINT: &str = include_str!("../pollpanel.toml");

const LOCAL_CONFIG: &str = "pollpanel.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub base_url: String,
    pub walker_endpoint: String,
    pub agent_id: String,
    pub module_root: String,
    pub api_token: Option<String>,
    pub page_limit: u32,
    pub log_file: Option<String>,
    #[serde(default)]
    pub action: BTreeMap<String, String>,
}

/// Values given on the command line. They win over every file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub agent_id: Option<String>,
    pub page_limit: Option<u32>,
}

impl Settings {
    pub fn new(overrides: &Overrides) -> anyhow::Result<Self> {
        let user_config_path = get_user_config_path()?;

        // Seed the user config from the blueprint on first start
        if !user_config_path.exists() {
            if let Some(parent) = user_config_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("could not create {}", parent.display()))?;
            }
            fs::write(&user_config_path, BLUEPRINT)
                .with_context(|| format!("could not write {}", user_config_path.display()))?;
        }

        let mut builder = Config::builder()
            // 1. Built-in defaults
            .add_source(File::from_str(BLUEPRINT, FileFormat::Toml))
            // 2. User's global config
            .add_source(File::from(user_config_path).required(false))
            // 3. pollpanel.toml in the CWD
            .add_source(File::with_name(LOCAL_CONFIG).required(false));

        if let Some(path) = &overrides.config {
            let expanded = expand_path(&path.to_string_lossy());
            builder = builder.add_source(File::from(expanded).required(true));
        }

        let s = builder
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option("agent_id", overrides.agent_id.clone())?
            .set_override_option("page_limit", overrides.page_limit.map(i64::from))?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.page_limit = settings.page_limit.max(1);
        Ok(settings)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(expand_path)
    }
}

pub fn get_user_config_path() -> anyhow::Result<PathBuf> {
    let mut path = dirs::home_dir().context("failed to get home directory")?;
    path.push(".config");
    path.push("pollpanel");
    path.push("pollpanel.toml");
    Ok(path)
}

/// The file edits are written to: the highest-precedence config file that
/// was loaded, so a saved value is the one seen on the next start.
pub fn get_save_path(overrides: &Overrides) -> anyhow::Result<PathBuf> {
    let local = Path::new(LOCAL_CONFIG);
    pick_save_path(
        overrides.config.as_deref(),
        local.exists().then_some(local),
        get_user_config_path()?,
    )
}

fn pick_save_path(explicit: Option<&Path>, local: Option<&Path>, user: PathBuf) -> anyhow::Result<PathBuf> {
    Ok(match (explicit, local) {
        (Some(path), _) => expand_path(&path.to_string_lossy()),
        (None, Some(path)) => path.to_path_buf(),
        (None, None) => user,
    })
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Writes one `[action]` parameter into the config file at `path`, keeping
/// everything else in the file as it is.
pub fn save_action_param(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let mut doc = config_str.parse::<toml::Table>()?;

    let action = doc
        .entry("action")
        .or_insert(toml::Value::Table(toml::Table::new()));
    let Some(table) = action.as_table_mut() else {
        anyhow::bail!("`action` in {} is not a table", path.display());
    };
    table.insert(key.to_string(), toml::Value::String(value.to_string()));

    fs::write(path, doc.to_string())?;
    Ok(())
}
