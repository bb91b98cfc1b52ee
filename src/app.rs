use crate::api::{ApiClient, HttpTransport};
use crate::db::TokenStore;
use crate::search::SearchOptions;
use crate::session::Session;
use failure::{Error, ResultExt};
use serde_derive::{Deserialize, Serialize};
use serde_json::{from_str, to_string_pretty};
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "reviews.config";
const BACKEND_ENV: &str = "BACKEND_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub backend_url: String,
    pub db_path: String,
    pub debounce_ms: u64,
    pub min_query_chars: usize,
    pub page_size: u32,
    pub search_threads: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            backend_url: String::from("http://localhost:8001"),
            db_path: String::from("session.db"),
            debounce_ms: 300,
            min_query_chars: 2,
            page_size: 9,
            search_threads: 2,
        }
    }
}

impl Config {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            delay: Duration::from_millis(self.debounce_ms),
            min_chars: self.min_query_chars,
            threads: self.search_threads,
        }
    }
}

/// Writes a default config file and creates the token database.
pub fn create_structure() -> Result<(), Error> {
    let config = Config::default();
    fs::write(CONFIG_FILE_NAME, to_string_pretty(&config)?)?;
    TokenStore::open(&config.db_path)?;
    Ok(())
}

pub fn config() -> Result<Config, Error> {
    let conf = fs::read_to_string(CONFIG_FILE_NAME)
        .with_context(|_| format!("Can't open: {}, run `new` first", CONFIG_FILE_NAME))?;
    let mut conf: Config = from_str(&conf)?;
    if let Ok(url) = env::var(BACKEND_ENV) {
        conf.backend_url = url;
    }
    Ok(conf)
}

/// Wires up a session against the configured backend and restores any
/// stored sign-in.
pub fn connect(config: &Config) -> Result<Session<HttpTransport>, Error> {
    let transport = HttpTransport::new(&config.backend_url)?;
    let store = TokenStore::open(&config.db_path)?;
    let mut session = Session::new(Arc::new(ApiClient::new(transport)), store);
    session.start()?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_shape() {
        let text = to_string_pretty(&Config::default()).unwrap();
        let back: Config = from_str(&text).unwrap();
        assert_eq!(back, Config::default());
        let options = back.search_options();
        assert_eq!(options.delay, Duration::from_millis(300));
        assert_eq!(options.min_chars, 2);
    }
}
