//! The code-unit seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::instance::AppInstance;

/// A loaded app code unit.
///
/// One module is shared by every running instance of its app; per-run state
/// belongs in the instance's scoped storage.
#[async_trait]
pub trait AppModule: Send + Sync {
    fn name(&self) -> &str;

    /// First output shown when an instance starts.
    fn banner(&self) -> Option<String> {
        None
    }

    /// Handle one line of input and return the output to display.
    async fn invoke(&self, instance: &AppInstance, input: &str) -> Result<String>;
}
