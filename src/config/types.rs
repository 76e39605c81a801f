use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub echo: EchoConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Artifact locations and the sequence contract the model was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_tokenizer_path")]
    pub tokenizer_path: String,
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    #[serde(default)]
    pub padding: Side,
    #[serde(default)]
    pub truncating: Side,
    #[serde(default)]
    pub pad_value: i64,
    /// Index of the injection class in the model's output row.
    #[serde(default)]
    pub positive_index: usize,
    #[serde(default)]
    pub input_type: InputType,
}

/// Which end of a sequence receives filler or loses ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Pre,
    Post,
}

/// Element type of the model's input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Float32,
    Int64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_echo_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub fail_open: bool,
    #[serde(default = "default_model_service_url")]
    pub model_service_url: String,
    #[serde(default = "default_model_service_timeout_ms")]
    pub model_service_timeout_ms: u64,
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Whole-exchange limit for forwarded requests.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub throttling: ThrottlingConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_block_threshold")]
    pub block: f64,
    #[serde(default = "default_monitor_threshold")]
    pub monitor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottlingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_time_window_minutes")]
    pub time_window_minutes: u64,
    #[serde(default = "default_block_duration_minutes")]
    pub block_duration_minutes: u64,
}

/// Trips after `failure_threshold` consecutive scoring failures and skips the
/// scoring service for `open_duration_seconds` before letting one trial call
/// through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_open_duration_seconds")]
    pub open_duration_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            tokenizer_path: default_tokenizer_path(),
            max_len: default_max_len(),
            padding: Side::Pre,
            truncating: Side::Pre,
            pad_value: 0,
            positive_index: 0,
            input_type: InputType::Float32,
        }
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_echo_port(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_gateway_port(),
            enabled: true,
            fail_open: true,
            model_service_url: default_model_service_url(),
            model_service_timeout_ms: default_model_service_timeout_ms(),
            upstream_url: default_upstream_url(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            thresholds: ThresholdsConfig::default(),
            cache: CacheConfig::default(),
            throttling: ThrottlingConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            block: default_block_threshold(),
            monitor: default_monitor_threshold(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl_seconds(),
            max_size: default_cache_max_size(),
        }
    }
}

impl Default for ThrottlingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            time_window_minutes: default_time_window_minutes(),
            block_duration_minutes: default_block_duration_minutes(),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: default_failure_threshold(),
            open_duration_seconds: default_open_duration_seconds(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_echo_port() -> u16 {
    8081
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_path() -> String {
    "model.onnx".to_string()
}

fn default_tokenizer_path() -> String {
    "tokenizer.json".to_string()
}

fn default_max_len() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_model_service_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_model_service_timeout_ms() -> u64 {
    2000
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_block_threshold() -> f64 {
    0.8
}

fn default_monitor_threshold() -> f64 {
    0.5
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_cache_max_size() -> usize {
    10_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_time_window_minutes() -> u64 {
    1
}

fn default_block_duration_minutes() -> u64 {
    15
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_duration_seconds() -> u64 {
    30
}
