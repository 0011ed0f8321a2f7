//! Scriptable worker host.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::port::{HostContext, ShardHost};

/// Host with a fixed context and optionally failing reloads.
#[derive(Debug, Default, Clone)]
pub struct StaticHost {
    pub context: HostContext,
    pub fail_reload: bool,
    pub reloads: u32,
    pub closed: bool,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_owned(), value.into());
        self
    }

    pub fn failing_reload(mut self) -> Self {
        self.fail_reload = true;
        self
    }
}

#[async_trait]
impl ShardHost for StaticHost {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        self.reloads += 1;
        if self.fail_reload {
            return Err(Error::Host("scripted reload failure".into()));
        }
        Ok(())
    }

    fn context(&self) -> HostContext {
        self.context.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_reload_is_a_host_error() {
        let mut host = StaticHost::new().failing_reload();
        assert!(matches!(host.reload().await, Err(Error::Host(_))));
        assert_eq!(host.reloads, 1);

        let mut host = StaticHost::new();
        assert!(host.reload().await.is_ok());
    }
}
