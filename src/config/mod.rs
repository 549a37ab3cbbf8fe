use crate::remote::RemoteSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use strum::{Display, EnumString};

pub const DEFAULT_LIST_ITEM_CLASS: &str = "ui-state-default";

/// Polling speed of a remote change monitor.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorInterval {
    ExtraFast,
    #[default]
    Fast,
    Normal,
    Slow,
    ExtraSlow,
}

/// Options accepted by `Nextlist::initialize`.
///
/// Keys mirror the public option names (`remoteNodeAddress`, `monitorInterval`, ...)
/// so the same object can be handed over from page configuration as JSON.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct NextlistOptions {
    /// Created through the session factory when absent.
    #[serde(skip)]
    pub remote_session: Option<Rc<dyn RemoteSession>>,
    pub remote_node_address: Option<String>,
    pub remote_node_secret: Option<String>,
    pub auto_start_monitoring: bool,
    pub monitor_interval: MonitorInterval,
    pub list_item_class_name: String,
    pub list_item_prefix: String,
    pub list_item_suffix: String,
}

impl Default for NextlistOptions {
    fn default() -> Self {
        Self {
            remote_session: None,
            remote_node_address: None,
            remote_node_secret: None,
            auto_start_monitoring: true,
            monitor_interval: MonitorInterval::default(),
            list_item_class_name: DEFAULT_LIST_ITEM_CLASS.to_string(),
            list_item_prefix: String::new(),
            list_item_suffix: String::new(),
        }
    }
}

impl fmt::Debug for NextlistOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextlistOptions")
            .field("remote_session", &self.remote_session.is_some())
            .field("remote_node_address", &self.remote_node_address)
            .field("remote_node_secret", &self.remote_node_secret.as_ref().map(|_| "***"))
            .field("auto_start_monitoring", &self.auto_start_monitoring)
            .field("monitor_interval", &self.monitor_interval)
            .field("list_item_class_name", &self.list_item_class_name)
            .field("list_item_prefix", &self.list_item_prefix)
            .field("list_item_suffix", &self.list_item_suffix)
            .finish()
    }
}

impl NextlistOptions {
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            remote_node_address: Some(address.into()),
            remote_node_secret: Some(secret.into()),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session: Rc<dyn RemoteSession>) -> Self {
        self.remote_session = Some(session);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads `window.ENV.NEXTLIST` when the host page provides it.
    ///
    /// Missing or malformed configuration falls back to the defaults.
    pub fn from_window() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Some(env) = window.get("ENV") else {
            return Self::default();
        };
        if env.is_undefined() || !env.is_object() {
            return Self::default();
        }

        let Ok(raw) = js_sys::Reflect::get(&env, &"NEXTLIST".into()) else {
            return Self::default();
        };
        if raw.is_undefined() || raw.is_null() {
            return Self::default();
        }

        js_sys::JSON::stringify(&raw)
            .ok()
            .and_then(|s| s.as_string())
            .and_then(|json| match Self::from_json(&json) {
                Ok(opts) => Some(opts),
                Err(e) => {
                    tracing::warn!("ignoring malformed window.ENV.NEXTLIST: {e}");
                    None
                }
            })
            .unwrap_or_default()
    }
}

/// How each visual item is decorated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemMarkup {
    pub class_name: String,
    /// Raw markup placed before the item text.
    pub prefix: String,
    /// Raw markup placed after the item text.
    pub suffix: String,
}

/// Validated per-list settings.
#[derive(Clone)]
pub struct Settings {
    pub session: Rc<dyn RemoteSession>,
    pub node_address: String,
    pub node_secret: String,
    pub auto_start_monitoring: bool,
    pub monitor_interval: MonitorInterval,
    pub markup: ItemMarkup,
}

impl Settings {
    pub(crate) fn from_options(
        options: NextlistOptions,
        session: Rc<dyn RemoteSession>,
        node_address: String,
        node_secret: String,
    ) -> Self {
        Self {
            session,
            node_address,
            node_secret,
            auto_start_monitoring: options.auto_start_monitoring,
            monitor_interval: options.monitor_interval,
            markup: ItemMarkup {
                class_name: options.list_item_class_name,
                prefix: options.list_item_prefix,
                suffix: options.list_item_suffix,
            },
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("node_address", &self.node_address)
            .field("auto_start_monitoring", &self.auto_start_monitoring)
            .field("monitor_interval", &self.monitor_interval)
            .field("markup", &self.markup)
            .finish_non_exhaustive()
    }
}
