/// Research progress events
///
/// A research run reports progress as a fixed sequence of seven steps. The
/// sequence is exposed as a stream paced by a tokio interval: the first event
/// is ready immediately and each following one a period later. Nothing runs
/// between ticks, and dropping the stream cancels whatever has not yet been
/// emitted.
///
/// # Example
///
/// ```no_run
/// use deepresearch_shared::research::progress::progress_stream;
/// use futures::StreamExt;
/// use std::time::Duration;
///
/// # async fn example() {
/// let mut events = Box::pin(progress_stream(Duration::from_secs(1)));
/// while let Some(event) = events.next().await {
///     println!("{}% {}", event.progress, event.step);
/// }
/// # }
/// ```

use chrono::{SecondsFormat, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;

/// Pace used by the HTTP stream
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_secs(1);

/// Run state carried by each event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Completed,
}

/// One entry of the progress sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStep {
    pub step: &'static str,
    pub progress: u8,
    pub sources: u32,
    pub status: ProgressStatus,
}

const fn step(step: &'static str, progress: u8, sources: u32, status: ProgressStatus) -> ProgressStep {
    ProgressStep {
        step,
        progress,
        sources,
        status,
    }
}

pub static PROGRESS_STEPS: [ProgressStep; 7] = [
    step("Starting research...", 0, 0, ProgressStatus::Processing),
    step("Finding relevant sources...", 20, 0, ProgressStatus::Processing),
    step("Found 3 academic papers", 40, 3, ProgressStatus::Processing),
    step("Found 5 news articles", 60, 8, ProgressStatus::Processing),
    step("Processing documents...", 80, 8, ProgressStatus::Processing),
    step("Generating summary...", 90, 8, ProgressStatus::Processing),
    step("Research complete!", 100, 8, ProgressStatus::Completed),
];

/// Progress event as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: String,
    pub progress: u8,
    /// RFC 3339, taken when the event is emitted
    pub timestamp: String,
    pub sources: u32,
    pub status: ProgressStatus,
}

impl ProgressStep {
    /// Stamps this step with the current time
    pub fn emit(&self) -> ProgressEvent {
        ProgressEvent {
            step: self.step.to_string(),
            progress: self.progress,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            sources: self.sources,
            status: self.status,
        }
    }
}

/// Streams [`PROGRESS_STEPS`], one every `period`
///
/// Must be called from within a tokio runtime.
pub fn progress_stream(period: Duration) -> impl Stream<Item = ProgressEvent> + Send + 'static {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::iter(PROGRESS_STEPS.iter())
        .zip(IntervalStream::new(interval))
        .map(|(step, _tick)| step.emit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_sequence_shape() {
        assert_eq!(PROGRESS_STEPS.len(), 7);
        assert_eq!(PROGRESS_STEPS[0].progress, 0);
        assert_eq!(PROGRESS_STEPS[6].progress, 100);
        assert!(PROGRESS_STEPS.windows(2).all(|w| w[0].progress < w[1].progress));
        assert!(PROGRESS_STEPS.windows(2).all(|w| w[0].sources <= w[1].sources));

        let completed: Vec<_> = PROGRESS_STEPS
            .iter()
            .filter(|s| s.status == ProgressStatus::Completed)
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].step, "Research complete!");
    }

    #[test]
    fn test_event_json_shape() {
        let event = PROGRESS_STEPS[2].emit();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["step"], "Found 3 academic papers");
        assert_eq!(json["progress"], 40);
        assert_eq!(json["sources"], 3);
        assert_eq!(json["status"], "processing");
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_emits_every_step_one_period_apart() {
        let start = Instant::now();
        let events: Vec<ProgressEvent> = progress_stream(Duration::from_secs(1)).collect().await;
        let elapsed = start.elapsed();

        assert_eq!(events.len(), 7);
        for (event, step) in events.iter().zip(PROGRESS_STEPS.iter()) {
            assert_eq!(event.step, step.step);
            assert_eq!(event.progress, step.progress);
            assert_eq!(event.sources, step.sources);
            assert_eq!(event.status, step.status);
        }

        // first event is immediate, the other six wait one period each
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_event_is_immediate() {
        let mut events = Box::pin(progress_stream(Duration::from_secs(1)));
        let start = Instant::now();

        let first = events.next().await.unwrap();
        assert_eq!(first.step, "Starting research...");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
