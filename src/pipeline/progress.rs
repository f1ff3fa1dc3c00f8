// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for model downloads
// reference: uses indicatif for progress bars and tracks transfer metrics

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct DownloadStats {
    pub files_fetched: usize,
    pub files_skipped: usize,
    pub bytes_written: u64,
    pub duration_secs: u64,
}

impl DownloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_files(&self) -> usize {
        self.files_fetched + self.files_skipped
    }

    pub fn bytes_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.bytes_written as f64 / self.duration_secs as f64
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    files_fetched: AtomicUsize,
    files_skipped: AtomicUsize,
    bytes_written: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_files: usize) -> Self {
        Self::with_color(total_files, true)
    }

    pub fn with_color(total_files: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            files_fetched: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn start_file(&self, name: &str) {
        self.detail_bar.set_message(format!("Fetching {}", name));
    }

    pub fn file_fetched(&self, bytes: u64) {
        self.files_fetched.fetch_add(1, Ordering::SeqCst);
        self.bytes_written.fetch_add(bytes, Ordering::SeqCst);
        self.main_bar.inc(1);
    }

    pub fn file_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Download complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> DownloadStats {
        DownloadStats {
            files_fetched: self.files_fetched.load(Ordering::SeqCst),
            files_skipped: self.files_skipped.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            "█▓▒░",
        )
    } else {
        ("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} files {msg}", "=>-")
    };

    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
