//! Terminal implementation of the feedback capability

use crate::logging::LogDestination;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use domain::{Feedback, ProgressTracker, Spinner};
use tracing::{error, info, warn};

/// Prints emoji-prefixed lines to stdout.
///
/// Lines are mirrored into the tracing log only when it goes to a file;
/// a console log would print them twice.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleFeedback {
    mirror: bool,
}

impl ConsoleFeedback {
    pub fn new(destination: LogDestination) -> Self {
        Self {
            mirror: destination == LogDestination::File,
        }
    }

    pub fn mirrors_to_log(&self) -> bool {
        self.mirror
    }
}

impl Feedback for ConsoleFeedback {
    fn info(&self, message: &str) {
        println!("ℹ️  {}", message);
        if self.mirror {
            info!("{}", message);
        }
    }

    fn success(&self, message: &str) {
        println!("✅ {}", message);
        if self.mirror {
            info!("{}", message);
        }
    }

    fn warning(&self, message: &str) {
        println!("⚠️  {}", message);
        if self.mirror {
            warn!("{}", message);
        }
    }

    fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
        if self.mirror {
            error!("{}", message);
        }
    }

    fn start_progress(&self, title: &str, total: u64) -> Box<dyn ProgressTracker> {
        println!("🚀 {}", title);
        Box::new(ConsoleProgress {
            title: title.to_string(),
            total,
            mirror: self.mirror,
        })
    }

    fn start_spinner(&self, message: &str) -> Box<dyn Spinner> {
        println!("⏳ {}", message);
        Box::new(ConsoleSpinner { mirror: self.mirror })
    }

    fn display_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        println!("{}", render_table(headers, rows));
    }
}

struct ConsoleProgress {
    title: String,
    total: u64,
    mirror: bool,
}

impl ConsoleProgress {
    fn percent(&self, current: u64) -> u64 {
        if self.total == 0 {
            100
        } else {
            current.min(self.total) * 100 / self.total
        }
    }
}

impl ProgressTracker for ConsoleProgress {
    fn update(&mut self, current: u64, message: &str) {
        println!(
            "   [{}/{}] {:>3}% {}",
            current.min(self.total),
            self.total,
            self.percent(current),
            message
        );
    }

    fn complete(&mut self, message: &str) {
        println!("✅ {}: {}", self.title, message);
        if self.mirror {
            info!("{}: {}", self.title, message);
        }
    }

    fn error(&mut self, message: &str) {
        eprintln!("❌ {}: {}", self.title, message);
        if self.mirror {
            error!("{}: {}", self.title, message);
        }
    }
}

struct ConsoleSpinner {
    mirror: bool,
}

impl Spinner for ConsoleSpinner {
    fn update(&mut self, message: &str) {
        println!("   ⏳ {}", message);
    }

    fn success(&mut self, message: &str) {
        println!("✅ {}", message);
        if self.mirror {
            info!("{}", message);
        }
    }

    fn error(&mut self, message: &str) {
        eprintln!("❌ {}", message);
        if self.mirror {
            error!("{}", message);
        }
    }
}

/// Render rows under headers as a UTF-8 box table
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());

    for row in rows {
        table.add_row(row.clone());
    }

    table.to_string()
}
