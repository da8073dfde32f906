//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (filter, stdout formatter)
//! - Keep the most recent formatted lines in memory for `GET /logs`
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - The in-memory buffer is a ring: oldest lines drop first

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ObservabilityConfig;

/// Bounded buffer of recent log lines, shared with the serving layer.
#[derive(Debug, Clone)]
pub struct RecentLogs {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl RecentLogs {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity,
        }
    }

    pub fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lock();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Copy of the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Buffered lines joined with newlines.
    pub fn render(&self) -> String {
        let lines = self.lock();
        let mut out = String::new();
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: Subscriber> Layer<S> for RecentLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut line = String::new();
        if SystemTime.format_time(&mut Writer::new(&mut line)).is_err() {
            line.clear();
        }
        let _ = write!(line, " {:>5} {}:", metadata.level(), metadata.target());

        let mut visitor = LineVisitor { line: &mut line };
        event.record(&mut visitor);

        self.push(line);
    }
}

/// Appends the message and `key=value` pairs of an event.
struct LineVisitor<'a> {
    line: &'a mut String,
}

impl Visit for LineVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let _ = write!(self.line, " {}", value);
        } else {
            let _ = write!(self.line, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.line, " {:?}", value);
        } else {
            let _ = write!(self.line, " {}={:?}", field.name(), value);
        }
    }
}

/// Install the global subscriber and return the `/logs` buffer.
pub fn init_logging(config: &ObservabilityConfig) -> RecentLogs {
    let recent = RecentLogs::new(config.log_buffer_lines);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cdn_proxy={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(recent.clone())
        .try_init();
    if installed.is_err() {
        tracing::warn!("Global subscriber already set; /logs will stay empty");
    }

    recent
}
