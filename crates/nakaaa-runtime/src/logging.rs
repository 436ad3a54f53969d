//! Subscriber installation.
//!
//! Components only emit through `tracing`. The runtime calls
//! [`init_from_config`] once with the `[logging]` section; embedders that want
//! their own setup can drive [`LoggingBuilder`] directly or install any other
//! subscriber first, in which case ours is skipped.
//!
//! `RUST_LOG` replaces the configured base level but per-target directives
//! from the config are still added on top.
//!
//! ```rust,ignore
//! use nakaaa_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("nakaaa_framework::dispatch=trace")
//!     .span_events(SpanEvents::lifecycle())
//!     .init();
//! ```

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{Level, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

const DEFAULT_LOG_FILE: &str = "nakaaa.log";

/// Span lifecycle events written alongside regular events.
///
/// Every dispatched command runs in a `command` span, so
/// [`SpanEvents::lifecycle`] yields a line when a command starts and one
/// with its busy/idle timings when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEvents(FmtSpan);

impl SpanEvents {
    pub fn none() -> Self {
        Self(FmtSpan::NONE)
    }

    pub fn lifecycle() -> Self {
        Self(FmtSpan::NEW | FmtSpan::CLOSE)
    }

    pub fn full() -> Self {
        Self(FmtSpan::FULL)
    }

    fn fmt_span(&self) -> FmtSpan {
        self.0.clone()
    }
}

impl Default for SpanEvents {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        let flags = [
            (config.new, FmtSpan::NEW),
            (config.enter, FmtSpan::ENTER),
            (config.exit, FmtSpan::EXIT),
            (config.close, FmtSpan::CLOSE),
        ];
        Self(
            flags
                .into_iter()
                .filter(|(on, _)| *on)
                .fold(FmtSpan::NONE, |acc, (_, span)| acc | span),
        )
    }
}

/// Installs the subscriber described by the `[logging]` section.
///
/// A subscriber installed earlier wins; this is then a no-op.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Assembles the filter and the formatting layer of the global subscriber.
#[derive(Debug)]
pub struct LoggingBuilder {
    level: Level,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    target: bool,
    thread_ids: bool,
    file_location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            directives: Vec::new(),
            span_events: SpanEvents::none(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            target: true,
            thread_ids: false,
            file_location: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));

        Self {
            level: config.level.to_tracing_level(),
            directives: filters
                .into_iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            span_events: SpanEvents::from(&config.span_events),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            target: true,
            thread_ids: config.thread_ids,
            file_location: config.file_location,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Adds an `EnvFilter` directive, e.g. `nakaaa_framework::event=debug`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Log file for [`LogOutput::File`]. Defaults to `./nakaaa.log`.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    pub fn with_file_location(mut self, enabled: bool) -> Self {
        self.file_location = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        let base = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_ascii_lowercase()));

        self.directives
            .iter()
            .fold(base, |filter, raw| match raw.parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(error) => {
                    warn!(directive = %raw, error = %error, "Skipping malformed log directive");
                    filter
                }
            })
    }

    fn log_file(&self) -> (&Path, &OsStr) {
        let path = self.file_path.as_deref();
        let dir = path
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file = path
            .and_then(Path::file_name)
            .unwrap_or(OsStr::new(DEFAULT_LOG_FILE));
        (dir, file)
    }

    fn writer(&self) -> BoxMakeWriter {
        match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
            LogOutput::File => {
                let (dir, file) = self.log_file();
                BoxMakeWriter::new(tracing_appender::rolling::never(dir, file))
            }
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(self.span_events.fmt_span())
            .with_target(self.target)
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
    }
}
