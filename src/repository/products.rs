use chrono::NaiveDate;

use crate::client::DataClient;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::query::{Direction, IsValue, Operator, QueryResult};

use super::PRODUCTS;

pub struct ProductRepository {
    client: DataClient,
}

impl ProductRepository {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> QueryResult<Vec<Product>> {
        self.client
            .from(PRODUCTS)
            .select("*")
            .order("name", Direction::Asc)
            .fetch()
            .await
    }

    pub async fn by_category(&self, category_id: i64) -> QueryResult<Vec<Product>> {
        self.client
            .from(PRODUCTS)
            .select("*")
            .eq("category_id", category_id)
            .order("name", Direction::Asc)
            .fetch()
            .await
    }

    pub async fn get(&self, id: i64) -> QueryResult<Product> {
        self.client
            .from(PRODUCTS)
            .select("*")
            .eq("id", id)
            .single()
            .await
    }

    pub async fn find_by_code(&self, code: &str) -> QueryResult<Product> {
        self.client
            .from(PRODUCTS)
            .select("*")
            .eq("code", code)
            .maybe_single()
            .await
    }

    /// Case-insensitive substring match on the name.
    pub async fn search(&self, term: &str) -> QueryResult<Vec<Product>> {
        let pattern = format!("*{}*", term.trim());
        self.client
            .from(PRODUCTS)
            .select("*")
            .ilike("name", &pattern)
            .order("name", Direction::Asc)
            .fetch()
            .await
    }

    /// Products with an expiry date on or before `date`, soonest first.
    pub async fn expiring_before(&self, date: NaiveDate) -> QueryResult<Vec<Product>> {
        self.client
            .from(PRODUCTS)
            .select("*")
            .not("expiry_date", Operator::Is, IsValue::Null)
            .lte("expiry_date", date)
            .order("expiry_date", Direction::Asc)
            .fetch()
            .await
    }

    /// PostgREST cannot compare two columns, so the threshold check runs here.
    pub async fn low_stock(&self) -> QueryResult<Vec<Product>> {
        self.list().await.map(|products| {
            products
                .into_iter()
                .filter(|p| p.stock_quantity <= p.min_stock_level)
                .collect()
        })
    }

    pub async fn create(&self, product: &NewProduct) -> QueryResult<Product> {
        self.client
            .from(PRODUCTS)
            .insert(product)
            .select("*")
            .single()
            .await
    }

    pub async fn update(&self, id: i64, patch: &ProductPatch) -> QueryResult<Product> {
        self.client
            .from(PRODUCTS)
            .update(patch)
            .eq("id", id)
            .select("*")
            .single()
            .await
    }

    pub async fn delete(&self, id: i64) -> QueryResult<()> {
        self.client
            .from(PRODUCTS)
            .delete()
            .eq("id", id)
            .execute()
            .await
            .map(|_| ())
    }
}
