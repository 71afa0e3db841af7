use serde_json::json;

use crate::client::DataClient;
use crate::error::AppError;
use crate::models::{Category, NewCategory};
use crate::query::{Direction, QueryResult};

use super::CATEGORIES;

fn checked_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

pub struct CategoryRepository {
    client: DataClient,
}

impl CategoryRepository {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> QueryResult<Vec<Category>> {
        self.client
            .from(CATEGORIES)
            .select("*")
            .order("name", Direction::Asc)
            .fetch()
            .await
    }

    pub async fn create(&self, name: &str) -> QueryResult<Category> {
        let name = match checked_name(name) {
            Ok(name) => name,
            Err(error) => return QueryResult::err(error),
        };
        self.client
            .from(CATEGORIES)
            .insert(&NewCategory {
                name: name.to_string(),
            })
            .select("*")
            .single()
            .await
    }

    pub async fn rename(&self, id: i64, name: &str) -> QueryResult<Category> {
        let name = match checked_name(name) {
            Ok(name) => name,
            Err(error) => return QueryResult::err(error),
        };
        self.client
            .from(CATEGORIES)
            .update(&json!({ "name": name }))
            .eq("id", id)
            .select("*")
            .single()
            .await
    }

    pub async fn delete(&self, id: i64) -> QueryResult<()> {
        self.client
            .from(CATEGORIES)
            .delete()
            .eq("id", id)
            .execute()
            .await
            .map(|_| ())
    }
}
