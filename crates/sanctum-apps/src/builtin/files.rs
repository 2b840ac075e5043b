//! The file browser: lists stored paths under a prefix.

use async_trait::async_trait;

use crate::capability::Capability;
use crate::error::Result;
use crate::instance::AppInstance;
use crate::module::AppModule;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesApp;

#[async_trait]
impl AppModule for FilesApp {
    fn name(&self) -> &str {
        "files"
    }

    /// `input` is the path prefix to list; empty lists everything.
    async fn invoke(&self, instance: &AppInstance, input: &str) -> Result<String> {
        let fs = instance
            .api
            .fs_read()
            .ok_or_else(|| instance.api.denied(Capability::FsRead))?;
        let entries = fs.list_directory(input.trim()).await?;
        if entries.is_empty() {
            return Ok("(empty)".to_owned());
        }
        Ok(entries.join("\n"))
    }
}
