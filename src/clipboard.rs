use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Write-only text sink for the share action
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Keeps the last copied text in memory
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.lock().await.clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.lock().await = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_clipboard_keeps_last_write() {
        let clipboard = MemoryClipboard::new();
        assert!(clipboard.contents().await.is_none());

        clipboard.write_text("first").await.unwrap();
        clipboard.write_text("second").await.unwrap();
        assert_eq!(clipboard.contents().await.as_deref(), Some("second"));
    }
}
