use std::env;

/// Agent configuration loaded from environment variables.
///
/// The source endpoints are fixed per adapter; everything that governs
/// pacing, retries, and merge behavior is tunable here.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Outbound HTTP
    pub http_timeout_secs: u64,
    pub user_agent: String,

    // Pacing
    pub tick_delay_secs: u64,
    pub idle_delay_secs: u64,
    pub enrichment_delay_secs: u64,
    pub repair_delay_secs: u64,

    // Retry / backoff
    pub max_attempts: i32,
    pub max_consecutive_failures: u32,
    pub failure_cooldown_secs: u64,

    // Rate-limit cooldowns, per source
    pub wikidata_cooldown_secs: u64,
    pub dbpedia_cooldown_secs: u64,
    pub wikipedia_cooldown_secs: u64,

    // Merge calibration
    pub merge_confidence_threshold: f32,
    pub dbpedia_offset: f32,
    pub wikipedia_offset: f32,

    // Refill
    pub unresearched_batch: i64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", 45),
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "rootline/0.1 (genealogy research)".to_string()),
            tick_delay_secs: env_or("TICK_DELAY_SECS", 5),
            idle_delay_secs: env_or("IDLE_DELAY_SECS", 10),
            enrichment_delay_secs: env_or("ENRICHMENT_DELAY_SECS", 30),
            repair_delay_secs: env_or("REPAIR_DELAY_SECS", 15),
            max_attempts: env_or("MAX_ATTEMPTS", 5),
            max_consecutive_failures: env_or("MAX_CONSECUTIVE_FAILURES", 5),
            failure_cooldown_secs: env_or("FAILURE_COOLDOWN_SECS", 90),
            wikidata_cooldown_secs: env_or("WIKIDATA_COOLDOWN_SECS", 90),
            dbpedia_cooldown_secs: env_or("DBPEDIA_COOLDOWN_SECS", 60),
            wikipedia_cooldown_secs: env_or("WIKIPEDIA_COOLDOWN_SECS", 60),
            merge_confidence_threshold: env_or("MERGE_CONFIDENCE_THRESHOLD", 95.0),
            dbpedia_offset: env_or("DBPEDIA_OFFSET", -5.0),
            wikipedia_offset: env_or("WIKIPEDIA_OFFSET", -10.0),
            unresearched_batch: env_or("UNRESEARCHED_BATCH", 20),
        }
    }
}

impl Default for Config {
    /// Defaults with a localhost database, used by tests.
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/rootline".to_string(),
            http_timeout_secs: 45,
            user_agent: "rootline/0.1 (genealogy research)".to_string(),
            tick_delay_secs: 5,
            idle_delay_secs: 10,
            enrichment_delay_secs: 30,
            repair_delay_secs: 15,
            max_attempts: 5,
            max_consecutive_failures: 5,
            failure_cooldown_secs: 90,
            wikidata_cooldown_secs: 90,
            dbpedia_cooldown_secs: 60,
            wikipedia_cooldown_secs: 60,
            merge_confidence_threshold: 95.0,
            dbpedia_offset: -5.0,
            wikipedia_offset: -10.0,
            unresearched_batch: 20,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got {v:?}")),
        Err(_) => default,
    }
}
