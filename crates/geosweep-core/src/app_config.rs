use std::path::PathBuf;

/// Runtime settings for a survey process, loaded from `GEOSWEEP_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub regions_path: PathBuf,
    pub search_base_url: String,
    pub search_user_agent: String,
    pub search_request_timeout_secs: u64,
    pub search_inter_request_delay_ms: u64,
    pub search_max_retries: u32,
    pub search_retry_backoff_base_ms: u64,
    pub survey_page_limit: u32,
    pub survey_max_concurrent_tiles: usize,
}
