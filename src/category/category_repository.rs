use crate::error::Result;
use axum::async_trait;
use sqlx::PgPool;
use super::category_models::Category;

/// Persistence for the category registry. Names are unique; inserts of an
/// existing name are no-ops.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories in insertion order.
    async fn list(&self) -> Result<Vec<Category>>;

    async fn insert_if_absent(&self, name: &str) -> Result<Category>;

    async fn insert_many_if_absent(&self, names: &[String]) -> Result<()>;
}

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for CategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY seq ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn insert_if_absent(&self, name: &str) -> Result<Category> {
        let inserted = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1)
             ON CONFLICT (name) DO NOTHING
             RETURNING id, name, created_at"
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(category) = inserted {
            return Ok(category);
        }

        let existing = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories WHERE name = $1"
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(existing)
    }

    async fn insert_many_if_absent(&self, names: &[String]) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (name)
             SELECT name FROM UNNEST($1::text[]) WITH ORDINALITY AS t(name, ord)
             ORDER BY ord
             ON CONFLICT (name) DO NOTHING"
        )
        .bind(names)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_insert_if_absent_is_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&url, 2).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = CategoryRepository::new(pool);

        let name = format!("Orienteering {}", Uuid::new_v4());
        let first = repo.insert_if_absent(&name).await.unwrap();
        let second = repo.insert_if_absent(&name).await.unwrap();
        assert_eq!(first.id, second.id);

        repo.insert_many_if_absent(&[name.clone(), name.clone()]).await.unwrap();
        let matching = repo.list().await.unwrap().into_iter().filter(|c| c.name == name).count();
        assert_eq!(matching, 1);
    }
}
