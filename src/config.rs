use std::env;

pub const DEFAULT_DATABASE_URL: &str = "ticket_office.sqlite3";
pub const DEFAULT_LOG_FILTER: &str = "ticket_office=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub log_filter: String,
}

impl Config {
    /// Reads `DATABASE_URL` and `RUST_LOG`, after loading a `.env` file when there is one.
    pub fn from_env() -> Config {
        dotenv::dotenv().ok();
        Config::from_vars(env::var("DATABASE_URL").ok(), env::var("RUST_LOG").ok())
    }

    fn from_vars(database_url: Option<String>, log_filter: Option<String>) -> Config {
        let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        Config {
            database_url: non_empty(database_url).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_filter: non_empty(log_filter).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_database(mut self, database_url: Option<&str>) -> Config {
        if let Some(url) = database_url {
            self.database_url = url.to_string();
        }
        self
    }
}
