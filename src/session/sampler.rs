//! Periodic, read-only observation of a live session.

use super::{LayoutSnapshot, LayoutView};
use crate::error::Result;
use crate::report::Sample;
use crossbeam_channel::{bounded, select, tick, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Turns published layout snapshots into report samples.
///
/// The sampler only reads the snapshot a session publishes after each pass.
/// It never touches the document or the engine, so sampling cannot trigger
/// a reflow.
pub struct Sampler;

impl Sampler {
    /// Capture one sample from a snapshot.
    pub fn capture(snapshot: &LayoutSnapshot) -> Sample {
        Sample {
            page_count_dom: Some(snapshot.page_count as f64),
            page_count_doc: Some(snapshot.estimated_pages as f64),
            max_scroll_ratio: Some(snapshot.width_ratio.max(1.0)),
            overflow_active: Some(snapshot.overflow),
        }
    }

    /// Start sampling `view` every `interval` on a background thread.
    pub fn spawn(view: LayoutView, interval: Duration) -> Result<SamplerHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread = thread::Builder::new()
            .name("pagereflow-sampler".into())
            .spawn(move || {
                let ticker = tick(interval);
                let mut samples = Vec::new();
                loop {
                    select! {
                        recv(ticker) -> _ => samples.push(Sampler::capture(&view.read())),
                        recv(stop_rx) -> _ => break,
                    }
                }
                log::debug!("sampler stopped after {} samples", samples.len());
                samples
            })?;

        Ok(SamplerHandle {
            stop: stop_tx,
            thread,
        })
    }
}

/// A running sampler thread.
pub struct SamplerHandle {
    stop: Sender<()>,
    thread: JoinHandle<Vec<Sample>>,
}

impl SamplerHandle {
    /// Stop sampling and return the samples taken, oldest first.
    pub fn stop(self) -> Vec<Sample> {
        let _ = self.stop.send(());
        match self.thread.join() {
            Ok(samples) => samples,
            Err(_) => {
                log::warn!("sampler thread panicked; its samples are lost");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(width_ratio: f64, overflow: bool) -> LayoutSnapshot {
        LayoutSnapshot {
            page_count: 3,
            estimated_pages: 2,
            width_ratio,
            overflow,
            passes: 1,
        }
    }

    #[test]
    fn test_capture() {
        let sample = Sampler::capture(&snapshot(0.8, false));
        assert_eq!(sample.page_count_dom, Some(3.0));
        assert_eq!(sample.page_count_doc, Some(2.0));
        assert_eq!(sample.max_scroll_ratio, Some(1.0));
        assert_eq!(sample.overflow_active, Some(false));

        let wide = Sampler::capture(&snapshot(1.3, true));
        assert_eq!(wide.max_scroll_ratio, Some(1.3));
        assert_eq!(wide.overflow_active, Some(true));
    }

    #[test]
    fn test_spawn_and_stop() {
        let view = LayoutView::default();
        view.publish(snapshot(1.0, false));

        let handle = Sampler::spawn(view, Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(30));
        let samples = handle.stop();

        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.page_count() == 3.0));
    }
}
