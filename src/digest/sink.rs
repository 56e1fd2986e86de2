/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Batch,
    Probe,
    Fetch,
    Validate,
    Prompt,
    Summarize,
    Deliver,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Batch => "batch",
            Stage::Probe => "probe",
            Stage::Fetch => "fetch",
            Stage::Validate => "validate",
            Stage::Prompt => "prompt",
            Stage::Summarize => "summarize",
            Stage::Deliver => "deliver",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Where the pipeline reports what it is doing. Passed in explicitly so the
/// core never touches process-wide logging state.
pub trait EventSink {
    fn emit(&self, severity: Severity, stage: Stage, group: Option<&str>, message: &str);

    fn debug(&self, stage: Stage, group: Option<&str>, message: &str) {
        self.emit(Severity::Debug, stage, group, message);
    }

    fn info(&self, stage: Stage, group: Option<&str>, message: &str) {
        self.emit(Severity::Info, stage, group, message);
    }

    fn warn(&self, stage: Stage, group: Option<&str>, message: &str) {
        self.emit(Severity::Warn, stage, group, message);
    }

    fn error(&self, stage: Stage, group: Option<&str>, message: &str) {
        self.emit(Severity::Error, stage, group, message);
    }
}

/// Production sink: forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, severity: Severity, stage: Stage, group: Option<&str>, message: &str) {
        let stage = stage.as_str();
        let group = group.unwrap_or("-");
        match severity {
            Severity::Debug => tracing::debug!(stage, group, "{message}"),
            Severity::Info => tracing::info!(stage, group, "{message}"),
            Severity::Warn => tracing::warn!(stage, group, "{message}"),
            Severity::Error => tracing::error!(stage, group, "{message}"),
        }
    }
}
