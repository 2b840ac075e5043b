//! Apps that ship with the system.

use std::sync::Arc;

use crate::manifest::{AppEntry, AppManifest, WindowSpec};
use crate::module::AppModule;

mod files;
mod settings;
mod terminal;

pub use files::FilesApp;
pub use settings::SettingsApp;
pub use terminal::{CLEAR_SCREEN, TerminalApp};

/// Look up a built-in module by the name used in [`AppEntry::Builtin`].
pub fn module(name: &str) -> Option<Arc<dyn AppModule>> {
    match name {
        "terminal" => Some(Arc::new(TerminalApp)),
        "files" => Some(Arc::new(FilesApp)),
        "settings" => Some(Arc::new(SettingsApp)),
        _ => None,
    }
}

fn builtin(id: &str, name: &str, module: &str, icon: &str) -> AppManifest {
    AppManifest::new(
        id,
        name,
        AppEntry::Builtin {
            name: module.to_owned(),
        },
    )
    .with_icon(icon)
}

fn window(width: u32, height: u32, resizable: bool) -> WindowSpec {
    WindowSpec {
        width: Some(width),
        height: Some(height),
        resizable: Some(resizable),
        ..WindowSpec::default()
    }
}

/// The `system.` manifests every registry starts with.
pub fn builtin_manifests() -> Vec<AppManifest> {
    vec![
        builtin("system.terminal", "Terminal", "terminal", "terminal")
            .with_description("Command line shell")
            .with_permissions(["fs:read", "fs:write", "system:info"])
            .with_main_window(window(800, 500, true)),
        builtin("system.files", "Files", "files", "folder")
            .with_description("Browse stored files")
            .with_permissions(["fs:read", "fs:write"])
            .with_main_window(window(900, 600, true)),
        builtin("system.settings", "Settings", "settings", "settings")
            .with_description("System information and preferences")
            .with_permissions(["system:info", "notifications"])
            .with_main_window(window(640, 480, false)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_resolves_and_is_system() {
        for manifest in builtin_manifests() {
            assert!(manifest.is_system());
            assert!(!manifest.autostart);
            manifest.validate().unwrap();
            let Some(AppEntry::Builtin { name }) = &manifest.main else {
                panic!("{} is not builtin", manifest.id);
            };
            assert!(module(name).is_some(), "{name}");
        }
    }
}
