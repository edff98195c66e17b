use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

#[async_trait]
pub trait SessionContext: Send + Sync {
    async fn token(&self) -> Option<String>;

    async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }

    async fn refresh(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct StaticSession {
    token: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token.filter(|token| !token.trim().is_empty());
    }
}

#[async_trait]
impl SessionContext for StaticSession {
    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        if self.token.read().await.is_some() {
            Ok(())
        } else {
            Err(StoreError::MissingSession)
        }
    }
}
