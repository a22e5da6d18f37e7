use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvError {
    // Page structure
    #[error("required element `{selector}` not found")]
    MissingElement { selector: String },

    #[error("element `{selector}` is not a {expected}")]
    WrongElementType {
        selector: String,
        expected: &'static str,
    },

    // Rendering
    #[error("{kind} context unavailable")]
    ContextUnavailable { kind: &'static str },

    #[error("shader compilation failed: {log}")]
    ShaderCompile { log: String },

    #[error("program link failed: {log}")]
    ProgramLink { log: String },

    #[error("could not allocate {what}")]
    GlResource { what: &'static str },

    // Configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    #[error("invalid configuration: {field} {problem}")]
    OutOfRange {
        field: &'static str,
        problem: &'static str,
    },

    #[error("channel {number} is a video channel without a video source")]
    MissingVideoSource { number: u32 },

    #[error("channel {number} is defined more than once")]
    DuplicateChannel { number: u32 },

    #[error("channel configuration is empty")]
    NoChannels,

    // Remote content
    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed weather report: {0}")]
    Weather(#[source] serde_json::Error),

    #[error("image decode failed: {reason}")]
    Decode { reason: String },

    // Anything thrown by the browser that has no better home
    #[error("browser error: {0}")]
    Js(String),
}

pub type Result<T> = std::result::Result<T, TvError>;
