use tokio::sync::watch;

/// Bytes received so far for one asset. `total` is unknown when the source
/// does not report a length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

pub type ProgressSender = watch::Sender<LoadProgress>;
pub type ProgressReceiver = watch::Receiver<LoadProgress>;

impl LoadProgress {
    /// Create a progress channel starting at zero bytes.
    pub fn channel() -> (ProgressSender, ProgressReceiver) {
        watch::channel(Self::default())
    }

    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.loaded as f64 / total as f64).min(1.0) as f32),
            None => None,
        }
    }

    pub(crate) fn report(progress: Option<&ProgressSender>, loaded: u64, total: Option<u64>) {
        if let Some(progress) = progress {
            // Nobody listening is fine
            let _ = progress.send(Self { loaded, total });
            log::trace!("Progress {}/{:?}", loaded, total);
        }
    }
}
