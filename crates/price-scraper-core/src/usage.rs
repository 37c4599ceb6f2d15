use std::time::Duration;

/// Token counts and wall time of the extract stage of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub elapsed: Duration,
}

impl ExtractionUsage {
    /// Completion tokens per second of extract time; zero when no time was measured.
    pub fn tokens_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completion_tokens as f64 / secs
        } else {
            0.0
        }
    }
}
