//! App manifests.
//!
//! A manifest is the serialized description of an app. Its JSON form is
//! what gets persisted under `system:installed-apps`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Ids with this prefix are reserved for built-in apps.
pub const SYSTEM_PREFIX: &str = "system.";

/// Where an app's code unit comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AppEntry {
    /// A code unit compiled into the binary, looked up by name.
    Builtin { name: String },
    /// An external module path.
    Module { path: String },
}

/// Default geometry for an app's main window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub resizable: Option<bool>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppWindows {
    pub main: Option<WindowSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub icon: String,
    pub main: Option<AppEntry>,
    pub permissions: BTreeSet<String>,
    pub windows: AppWindows,
    pub services: Vec<String>,
    pub autostart: bool,
}

impl AppManifest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, main: AppEntry) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: "1.0.0".to_owned(),
            main: Some(main),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_main_window(mut self, spec: WindowSpec) -> Self {
        self.windows.main = Some(spec);
        self
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    pub fn is_system(&self) -> bool {
        is_system_id(&self.id)
    }

    /// Reject manifests missing an id, a name or a code unit.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::InvalidManifest { field: "id" });
        }
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidManifest { field: "name" });
        }
        if self.main.is_none() {
            return Err(AppError::InvalidManifest { field: "main" });
        }
        Ok(())
    }
}

pub fn is_system_id(id: &str) -> bool {
    id.starts_with(SYSTEM_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AppEntry {
        AppEntry::Builtin {
            name: "terminal".into(),
        }
    }

    #[test]
    fn validate_names_missing_field() {
        let ok = AppManifest::new("com.example.notes", "Notes", entry());
        assert!(ok.validate().is_ok());

        let mut m = ok.clone();
        m.id.clear();
        assert!(matches!(m.validate(), Err(AppError::InvalidManifest { field: "id" })));

        let mut m = ok.clone();
        m.name = "  ".into();
        assert!(matches!(m.validate(), Err(AppError::InvalidManifest { field: "name" })));

        let mut m = ok;
        m.main = None;
        assert!(matches!(m.validate(), Err(AppError::InvalidManifest { field: "main" })));
    }

    #[test]
    fn json_shape() {
        let m = AppManifest::new("com.example.notes", "Notes", entry())
            .with_permissions(["fs:read"])
            .with_main_window(WindowSpec {
                width: Some(400),
                min_width: Some(200),
                ..WindowSpec::default()
            });
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["main"]["type"], "builtin");
        assert_eq!(json["main"]["name"], "terminal");
        assert_eq!(json["windows"]["main"]["minWidth"], 200);
        assert_eq!(json["permissions"][0], "fs:read");

        let back: AppManifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn sparse_json_fills_defaults() {
        let m: AppManifest = serde_json::from_str(
            r#"{"id":"x","name":"X","main":{"type":"module","path":"apps/x.wasm"}}"#,
        )
        .unwrap();
        assert!(!m.autostart);
        assert!(m.permissions.is_empty());
        assert!(m.windows.main.is_none());
        assert_eq!(
            m.main,
            Some(AppEntry::Module {
                path: "apps/x.wasm".into()
            })
        );
    }

    #[test]
    fn system_prefix() {
        assert!(is_system_id("system.terminal"));
        assert!(!is_system_id("systemic.app"));
    }
}
