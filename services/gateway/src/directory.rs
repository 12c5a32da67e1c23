use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logo_url: String,
}

/// Source of the providers a user can verify against.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<ProviderInfo>>;

    async fn find(&self, id: &str) -> anyhow::Result<Option<ProviderInfo>> {
        let id = id.to_lowercase();
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }
}

/// Fixed provider list.
pub struct StaticDirectory {
    providers: Vec<ProviderInfo>,
}

impl StaticDirectory {
    pub fn new(providers: Vec<ProviderInfo>) -> Self {
        Self { providers }
    }
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self::new(vec![
            ProviderInfo {
                id: "github".to_string(),
                name: "GitHub".to_string(),
                description: "Verify your GitHub contributions".to_string(),
                logo_url: "https://github.githubassets.com/images/modules/logos_page/GitHub-Mark.png".to_string(),
            },
            ProviderInfo {
                id: "twitter".to_string(),
                name: "Twitter".to_string(),
                description: "Verify your Twitter activity".to_string(),
                logo_url: "https://abs.twimg.com/responsive-web/client-web/icon-ios.b1fc727a.png".to_string(),
            },
        ])
    }
}

#[async_trait]
impl ProviderDirectory for StaticDirectory {
    async fn list(&self) -> anyhow::Result<Vec<ProviderInfo>> {
        Ok(self.providers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_is_case_insensitive() {
        let dir = StaticDirectory::default();
        assert_eq!(dir.list().await.unwrap().len(), 2);
        assert_eq!(dir.find("GitHub").await.unwrap().unwrap().name, "GitHub");
        assert!(dir.find("linkedin").await.unwrap().is_none());
    }
}
