use crate::stats::DEFAULT_CAPACITY;
use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub port: u16,
    pub capacity: usize,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            port: DEFAULT_PORT,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("PARKING_API_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_base_url,
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
            capacity: parse_or("PARKING_CAPACITY", lookup("PARKING_CAPACITY"), DEFAULT_CAPACITY),
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, value: Option<String>, default: T) -> T {
    let Some(value) = value else {
        return default;
    };
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!("invalid {key} value {value:?}, using default");
            default
        }
    }
}
