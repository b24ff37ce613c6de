use crate::error::Result;
use std::sync::Arc;
use super::{category_models::Category, category_repository::CategoryStore};

/// Names inserted the first time the registry is read while empty.
pub const SEED_CATEGORIES: [&str; 12] = [
    "Drawing & Painting",
    "Photography",
    "Video Gaming",
    "Fishing",
    "Running",
    "Cooking",
    "Reading",
    "Writing",
    "Hiking",
    "Board Games",
    "Gardening",
    "Music",
];

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryStore>) -> Self {
        Self { repo }
    }

    pub async fn list_names(&self) -> Result<Vec<String>> {
        let mut categories = self.repo.list().await?;

        if categories.is_empty() {
            tracing::info!("Category registry empty, seeding {} categories", SEED_CATEGORIES.len());
            let seed: Vec<String> = SEED_CATEGORIES.iter().map(|s| s.to_string()).collect();
            self.repo.insert_many_if_absent(&seed).await?;
            categories = self.repo.list().await?;
        }

        Ok(categories.into_iter().map(|c| c.name).collect())
    }

    pub async fn add(&self, name: &str) -> Result<Category> {
        let category = self.repo.insert_if_absent(name).await?;
        tracing::debug!("Category '{}' registered", category.name);
        Ok(category)
    }

    pub async fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.list_names().await?.iter().any(|n| n == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::category_memory_repository::InMemoryCategoryRepository;

    fn service() -> CategoryService {
        CategoryService::new(Arc::new(InMemoryCategoryRepository::new()))
    }

    #[tokio::test]
    async fn test_first_list_seeds_exactly_once() {
        let service = service();

        let first = service.list_names().await.unwrap();
        assert_eq!(first, SEED_CATEGORIES.to_vec());

        let second = service.list_names().await.unwrap();
        assert_eq!(second.len(), 12);
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_do_not_duplicate() {
        let service = service();

        let reads = (0..8).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.list_names().await.unwrap() })
        });
        for read in futures::future::join_all(reads).await {
            assert_eq!(read.unwrap().len(), 12);
        }

        assert_eq!(service.list_names().await.unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_add_is_idempotent_by_name() {
        let service = service();
        service.list_names().await.unwrap();

        let first = service.add("Knitting").await.unwrap();
        let again = service.add("Knitting").await.unwrap();
        assert_eq!(first.id, again.id);

        let names = service.list_names().await.unwrap();
        assert_eq!(names.len(), 13);
        assert_eq!(names.last().map(String::as_str), Some("Knitting"));
    }

    #[tokio::test]
    async fn test_add_on_empty_registry_skips_seed() {
        let service = service();
        service.add("Knitting").await.unwrap();

        assert_eq!(service.list_names().await.unwrap(), vec!["Knitting".to_string()]);
        assert!(service.contains("Knitting").await.unwrap());
        assert!(!service.contains("Music").await.unwrap());
    }
}
