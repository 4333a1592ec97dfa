use std::fmt;

/// Verbosity accepted through the mirror's `LogLevel` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Critical,
    Warning,
    #[default]
    Info,
    Debug,
}

pub const LOG_LEVEL_ALLOW_LIST: [LogLevel; 4] = [
    LogLevel::Critical,
    LogLevel::Warning,
    LogLevel::Info,
    LogLevel::Debug,
];

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Exact, case-sensitive match against the allow-list.
    pub fn parse(value: &str) -> Option<Self> {
        LOG_LEVEL_ALLOW_LIST
            .into_iter()
            .find(|level| level.as_str() == value)
    }

    /// Unset or unrecognised settings fall back to `INFO`.
    pub fn from_setting(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
