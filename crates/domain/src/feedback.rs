//! User feedback capability: leveled messages, progress, spinners and tables

/// Bounded progress reporting (e.g. "3/5 nodes launched")
pub trait ProgressTracker: Send {
    fn update(&mut self, current: u64, message: &str);
    fn complete(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Indeterminate wait indicator
pub trait Spinner: Send {
    fn update(&mut self, message: &str);
    fn success(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

pub trait Feedback: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);

    fn start_progress(&self, title: &str, total: u64) -> Box<dyn ProgressTracker>;
    fn start_spinner(&self, message: &str) -> Box<dyn Spinner>;

    fn display_table(&self, headers: &[&str], rows: &[Vec<String>]);
}
