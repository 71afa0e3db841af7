use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub schema: String,
    pub http_timeout_secs: u64,
    pub storage_bucket: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            supabase_url: env::var("SUPABASE_URL")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")?,
            schema: env::var("SUPABASE_SCHEMA").unwrap_or_else(|_| "public".to_string()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "product-images".to_string()),
        })
    }

    pub fn new(supabase_url: impl Into<String>, supabase_anon_key: impl Into<String>) -> Self {
        Config {
            supabase_url: supabase_url.into(),
            supabase_anon_key: supabase_anon_key.into(),
            schema: "public".to_string(),
            http_timeout_secs: 30,
            storage_bucket: "product-images".to_string(),
        }
    }

    fn base(&self) -> &str {
        self.supabase_url.trim_end_matches('/')
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base())
    }

    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base())
    }

    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.base())
    }
}
