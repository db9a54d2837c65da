// ── Refresh scheduling ──
//
// The polling rate value type and the cancellable timer task that
// drives periodic device polls.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;

/// Shortest accepted polling interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

/// How often the device list is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RefreshRate {
    /// No periodic polling.
    #[default]
    Disabled,
    /// Poll once per interval.
    Every(Duration),
}

impl RefreshRate {
    pub fn from_millis(ms: u64) -> Self {
        Self::Every(Duration::from_millis(ms))
    }

    pub fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled)
    }

    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Every(d) => Some(d),
        }
    }

    /// Reject intervals shorter than [`MIN_REFRESH_INTERVAL`].
    pub fn validate(self) -> Result<Self, CoreError> {
        match self {
            Self::Every(d) if d.is_zero() => Err(CoreError::InvalidRate {
                reason: "interval must be positive".into(),
            }),
            Self::Every(d) if d < MIN_REFRESH_INTERVAL => Err(CoreError::InvalidRate {
                reason: format!(
                    "{} ms is below the minimum of {} ms",
                    d.as_millis(),
                    MIN_REFRESH_INTERVAL.as_millis()
                ),
            }),
            other => Ok(other),
        }
    }

    /// Short label: `off`, `{s} sec` under a minute, else `{m} min`.
    pub fn human(self) -> String {
        let Self::Every(d) = self else {
            return "off".to_owned();
        };
        let ms = d.as_millis();
        if ms < 60_000 {
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            let secs = ms as f64 / 1000.0;
            format!("{secs} sec")
        } else {
            format!("{} min", (ms + 30_000) / 60_000)
        }
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("off"),
            Self::Every(d) => write!(f, "{}", humantime::format_duration(*d)),
        }
    }
}

/// Accepts `off`/`disabled`/`none`/`false`, a bare number of milliseconds,
/// or a humantime duration (`5s`, `2m`, `1m 30s`). The result is validated.
impl FromStr for RefreshRate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rate = match s.to_ascii_lowercase().as_str() {
            "off" | "disabled" | "none" | "false" => Self::Disabled,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                let ms = digits.parse::<u64>().map_err(|e| CoreError::InvalidRate {
                    reason: e.to_string(),
                })?;
                Self::from_millis(ms)
            }
            _ => Self::Every(humantime::parse_duration(s).map_err(|e| {
                CoreError::InvalidRate {
                    reason: format!("{s:?}: {e}"),
                }
            })?),
        };
        rate.validate()
    }
}

impl TryFrom<String> for RefreshRate {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RefreshRate> for String {
    fn from(rate: RefreshRate) -> Self {
        rate.to_string()
    }
}

// ── Timer ────────────────────────────────────────────────────────────

/// A running periodic task. Cancelled on [`cancel`](Self::cancel) or drop.
#[derive(Debug)]
pub(crate) struct RefreshTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Spawn a task calling `tick` every `period`, first call one period
    /// from now. The task stops when `tick` returns `false`, when this timer
    /// is cancelled, or when `parent` is cancelled.
    pub(crate) fn start<F>(period: Duration, parent: &CancellationToken, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let token = parent.child_token();
        let cancel = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if !tick() {
                            break;
                        }
                    }
                }
            }
            debug!(?period, "refresh timer stopped");
        });

        Self { token, handle }
    }

    /// Idempotent.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn human_labels() {
        assert_eq!(RefreshRate::Disabled.human(), "off");
        assert_eq!(RefreshRate::from_millis(1000).human(), "1 sec");
        assert_eq!(RefreshRate::from_millis(1500).human(), "1.5 sec");
        assert_eq!(RefreshRate::from_millis(59_000).human(), "59 sec");
        assert_eq!(RefreshRate::from_millis(60_000).human(), "1 min");
        assert_eq!(RefreshRate::from_millis(89_999).human(), "1 min");
        assert_eq!(RefreshRate::from_millis(90_000).human(), "2 min");
        assert_eq!(RefreshRate::from_millis(600_000).human(), "10 min");
    }

    #[test]
    fn validate_enforces_minimum() {
        assert!(RefreshRate::Disabled.validate().is_ok());
        assert!(RefreshRate::from_millis(1000).validate().is_ok());
        let err = RefreshRate::from_millis(500).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidRate { .. }));
        assert!(RefreshRate::from_millis(0).validate().is_err());
    }

    #[test]
    fn parse_accepts_words_millis_and_durations() {
        assert_eq!("off".parse::<RefreshRate>().unwrap(), RefreshRate::Disabled);
        assert_eq!("Disabled".parse::<RefreshRate>().unwrap(), RefreshRate::Disabled);
        assert_eq!(
            "5000".parse::<RefreshRate>().unwrap(),
            RefreshRate::from_millis(5000)
        );
        assert_eq!(
            "1m 30s".parse::<RefreshRate>().unwrap(),
            RefreshRate::from_millis(90_000)
        );
        assert!("500".parse::<RefreshRate>().is_err());
        assert!("soon".parse::<RefreshRate>().is_err());
    }

    #[test]
    fn serde_uses_display_form() {
        let rate = RefreshRate::from_millis(30_000);
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, "\"30s\"");
        let back: RefreshRate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rate);
        assert!(serde_json::from_str::<RefreshRate>("\"10ms\"").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ticks_after_each_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let root = CancellationToken::new();
        let timer = RefreshTimer::start(Duration::from_secs(2), &root, move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(4200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        timer.cancel();
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_stops_with_parent_or_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let root = CancellationToken::new();

        let c = Arc::clone(&count);
        let _timer = RefreshTimer::start(Duration::from_secs(1), &root, move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });
        root.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let root = CancellationToken::new();
        let c = Arc::clone(&count);
        let timer = RefreshTimer::start(Duration::from_secs(1), &root, move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });
        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_timer_leaves_one_schedule() {
        let count = Arc::new(AtomicUsize::new(0));
        let root = CancellationToken::new();

        let c = Arc::clone(&count);
        let fast = RefreshTimer::start(Duration::from_secs(1), &root, move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });
        fast.cancel();
        let c = Arc::clone(&count);
        let slow = RefreshTimer::start(Duration::from_secs(5), &root, move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });

        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!fast.is_active());
        assert!(slow.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_stops_when_tick_declines() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let root = CancellationToken::new();
        let timer = RefreshTimer::start(Duration::from_secs(1), &root, move || {
            c.fetch_add(1, Ordering::SeqCst) < 1
        });
        tokio::time::sleep(Duration::from_millis(5500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!timer.is_active());
    }
}
