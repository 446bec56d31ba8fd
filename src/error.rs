// src/error.rs
use http::StatusCode;
use thiserror::Error;

// 同步层的主要错误类型：只通过缓存条目的 error 字段暴露给消费者，
// 绝不跨缓存边界直接抛出
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Core returned an error status: {0}")]
    Transport(StatusCode),

    #[error("Malformed response body: {0}")]
    Shape(String),

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),
}
