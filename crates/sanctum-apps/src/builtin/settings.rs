//! Settings: reports system information.

use async_trait::async_trait;
use sanctum_notify::Priority;

use crate::error::Result;
use crate::instance::AppInstance;
use crate::module::AppModule;

#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsApp;

#[async_trait]
impl AppModule for SettingsApp {
    fn name(&self) -> &str {
        "settings"
    }

    async fn invoke(&self, instance: &AppInstance, input: &str) -> Result<String> {
        let input = input.trim();
        let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
        match cmd {
            "" | "info" => {
                let Some(reader) = instance.api.system_info() else {
                    return Ok("system information not permitted".to_owned());
                };
                let info = reader.get().await?;
                Ok(format!(
                    "platform: {}\narch: {}\nversion: {}\nhostname: {}\nuptime: {}s",
                    info.platform, info.arch, info.version, info.hostname, info.uptime
                ))
            }
            "notify" => match instance.api.notifications() {
                Some(notifier) => {
                    let id = notifier.notify("Settings", rest.trim(), Priority::Low);
                    Ok(format!("notification {id} sent"))
                }
                None => Ok("notifications not permitted".to_owned()),
            },
            other => Ok(format!("Unknown setting: {other}")),
        }
    }
}
