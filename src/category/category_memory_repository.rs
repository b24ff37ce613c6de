use crate::error::Result;
use axum::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use super::{category_models::Category, category_repository::CategoryStore};

#[derive(Clone, Default)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<Vec<Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn push_if_absent(categories: &mut Vec<Category>, name: &str) -> Category {
    if let Some(existing) = categories.iter().find(|c| c.name == name) {
        return existing.clone();
    }

    let category = Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: Utc::now(),
    };
    categories.push(category.clone());
    category
}

#[async_trait]
impl CategoryStore for InMemoryCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().await.clone())
    }

    async fn insert_if_absent(&self, name: &str) -> Result<Category> {
        let mut categories = self.categories.write().await;
        Ok(push_if_absent(&mut categories, name))
    }

    async fn insert_many_if_absent(&self, names: &[String]) -> Result<()> {
        let mut categories = self.categories.write().await;
        for name in names {
            push_if_absent(&mut categories, name);
        }
        Ok(())
    }
}
