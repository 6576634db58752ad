use std::path::Path;
use std::time::Instant;

use accrete::contexts::{ResponseReport, SessionSummary, StopReason};

/// Running totals across rounds, printed as a summary at the end
pub struct ProgressIndicator {
    written: usize,
    unchanged: usize,
    failed: usize,
    start_time: Instant,
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressIndicator {
    pub fn new() -> Self {
        Self {
            written: 0,
            unchanged: 0,
            failed: 0,
            start_time: Instant::now(),
        }
    }

    pub fn start_round(&self, round: usize) {
        println!("\nGenerating code for round {}...", round);
    }

    pub fn complete_round(&mut self, round: usize, report: &ResponseReport) {
        println!("\nResponse for round {} processed.", round);
        for message in &report.messages {
            println!("  {}", message);
        }

        self.written += report.files_written;
        self.unchanged += report.files_unchanged;
        self.failed += report.files_failed;
    }

    pub fn finish(&self, summary: &SessionSummary, output_dir: &Path) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        match &summary.stop_reason {
            StopReason::Stopped => println!("Code generation completed."),
            StopReason::RoundLimit => println!("Round limit reached."),
            StopReason::GenerationFailed(e) => println!("Generation stopped: {}", e),
        }
        println!(
            "Generated {} files across {} rounds.",
            summary.files, summary.rounds
        );
        println!("  Writes:    {}", self.written);
        println!("  Unchanged: {}", self.unchanged);
        println!("  Failed:    {}", self.failed);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("Files are available in: {}", output_dir.display());
        println!("{}", "=".repeat(60));
    }
}
