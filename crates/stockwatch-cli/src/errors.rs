use console::style;
use std::fmt;
use stockwatch_core::error::StockwatchError;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// No detector command or URL configured, or the detector cannot be started
pub fn detector_unavailable(reason: &str, remediation: &str) -> CliError {
    CliError::new("Detector not available")
        .with_context(format!("The ingestion worker needs an object detector.\n\nReason: {}", reason))
        .with_suggestion(remediation.to_string())
        .with_suggestion("Or set STOCKWATCH_DETECTOR_COMMAND / STOCKWATCH_DETECTOR_URL")
        .with_help("Run: stockwatch worker --help")
}

/// Capture time argument that is neither a number nor a defect image name
pub fn invalid_timestamp(input: &str) -> CliError {
    CliError::new("Invalid capture time")
        .with_context(format!(
            "Expected epoch seconds or a defect image name.\n\nGot: {}",
            input
        ))
        .with_suggestion("Pass seconds, e.g. stockwatch locate 1707000000.5")
        .with_suggestion("Or an image name, e.g. stockwatch locate defect_1707000000.5.jpg")
        .with_help("Run: stockwatch locate --help")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check the config file passed with --config or STOCKWATCH_CONFIG")
        .with_suggestion("Check STOCKWATCH_* environment variables")
        .with_help("Run: stockwatch config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let domain = error.chain().find_map(|cause| cause.downcast_ref::<StockwatchError>());

    match domain {
        Some(StockwatchError::DetectorUnavailable { reason, remediation }) => {
            return detector_unavailable(reason, remediation);
        }
        Some(StockwatchError::InvalidFilename { name }) => {
            return invalid_timestamp(name);
        }
        Some(StockwatchError::ConfigInvalid { key, reason }) => {
            return invalid_config(key, reason);
        }
        Some(StockwatchError::DirectoryUnavailable { path, source }) => {
            return CliError::new("Data directory unavailable")
                .with_context(format!("Path: {}\n\nError: {}", path.display(), source))
                .with_suggestion("Check that the data directory is writable")
                .with_suggestion("Or point --data-dir at another location");
        }
        _ => {}
    }

    let message = format!("{:#}", error);
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.to_lowercase().contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
            .with_suggestion("Or run with appropriate privileges")
    } else {
        CliError::new(message)
    }
}
