use crate::client::DataClient;
use crate::models::{User, UserRole};
use crate::query::{Direction, QueryResult};

use super::USERS;

pub struct UserRepository {
    client: DataClient,
}

impl UserRepository {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> QueryResult<Vec<User>> {
        self.client
            .from(USERS)
            .select("*")
            .order("email", Direction::Asc)
            .fetch()
            .await
    }

    pub async fn get(&self, id: &str) -> QueryResult<User> {
        self.client
            .from(USERS)
            .select("*")
            .eq("id", id)
            .single()
            .await
    }

    pub async fn by_role(&self, role: UserRole) -> QueryResult<Vec<User>> {
        self.client
            .from(USERS)
            .select("*")
            .eq("role", role)
            .order("email", Direction::Asc)
            .fetch()
            .await
    }
}
