//! Render policy — decides when the frame buffer is pushed to hardware.
//!
//! Two strategies: message-triggered (render only when an update asks for
//! it) and periodic (fixed wall-clock cadence, independent of traffic).
//! [`RenderGate`] takes the current instant as a parameter so tests can
//! drive a synthetic clock.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Upper bound on how long a receive may block before the loop re-checks
/// its shutdown flag.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Render triggering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Render only when a decoded update carries `render = true`. A sender
    /// that never sets the flag gets no renders; this is deliberate, not a
    /// bug — batching senders control exactly when the strip refreshes.
    #[serde(rename = "message")]
    MessageTriggered,
    /// Render on a fixed cadence regardless of message arrival. Useful when
    /// updates arrive faster than the hardware can usefully refresh.
    #[serde(rename = "periodic")]
    Periodic,
}

impl Default for RenderMode {
    fn default() -> Self {
        RenderMode::MessageTriggered
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::MessageTriggered => write!(f, "message"),
            RenderMode::Periodic => write!(f, "periodic"),
        }
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "message" => Ok(RenderMode::MessageTriggered),
            "periodic" => Ok(RenderMode::Periodic),
            other => Err(format!(
                "unknown render mode: {other} (use \"message\" or \"periodic\")"
            )),
        }
    }
}

/// Stateful render decision for the serve loop.
pub struct RenderGate {
    mode: RenderMode,
    /// Frame interval; meaningful in periodic mode only.
    interval: Duration,
    /// Next periodic deadline, armed on first `due` call.
    next: Option<Instant>,
}

impl RenderGate {
    /// `rate` is renders per second; ignored in message-triggered mode.
    /// Callers validate `rate > 0` for periodic mode (see `Config::validate`).
    pub fn new(mode: RenderMode, rate: u32) -> Self {
        let rate = rate.max(1);
        RenderGate {
            mode,
            interval: Duration::from_secs(1) / rate,
            next: None,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Should the buffer be committed because of this update?
    pub fn on_update(&mut self, render_requested: bool) -> bool {
        match self.mode {
            RenderMode::MessageTriggered => render_requested,
            RenderMode::Periodic => false,
        }
    }

    /// Has the periodic deadline passed? Checked once per loop iteration,
    /// including iterations where the receive timed out.
    ///
    /// The first call always fires and arms the cadence. When the loop falls
    /// behind (a slow render), missed intervals are skipped rather than
    /// replayed in a burst.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.mode {
            RenderMode::MessageTriggered => false,
            RenderMode::Periodic => {
                let next = self.next.get_or_insert(now);
                if now < *next {
                    return false;
                }
                let mut deadline = *next + self.interval;
                if deadline <= now {
                    deadline = now + self.interval;
                }
                *next = deadline;
                true
            }
        }
    }

    /// How long a blocking receive may wait. Periodic mode needs wakeups at
    /// least once per frame interval; both modes cap the wait so shutdown is
    /// observed promptly.
    pub fn poll_interval(&self) -> Duration {
        match self.mode {
            RenderMode::MessageTriggered => MAX_POLL_INTERVAL,
            RenderMode::Periodic => self.interval.min(MAX_POLL_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── RenderMode parsing ──

    #[test]
    fn parse_message_mode() {
        assert_eq!("message".parse(), Ok(RenderMode::MessageTriggered));
        assert_eq!("MESSAGE".parse(), Ok(RenderMode::MessageTriggered));
        assert_eq!("  message ".parse(), Ok(RenderMode::MessageTriggered));
    }

    #[test]
    fn parse_periodic_mode() {
        assert_eq!("periodic".parse(), Ok(RenderMode::Periodic));
    }

    #[test]
    fn parse_unknown_mode_fails() {
        assert!("always".parse::<RenderMode>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for mode in [RenderMode::MessageTriggered, RenderMode::Periodic] {
            assert_eq!(mode.to_string().parse::<RenderMode>(), Ok(mode));
        }
    }

    #[test]
    fn serde_uses_short_names() {
        assert_eq!(
            toml::to_string(&std::collections::BTreeMap::from([(
                "render_mode",
                RenderMode::MessageTriggered
            )]))
            .unwrap()
            .trim(),
            "render_mode = \"message\""
        );
    }

    // ── Message-triggered gate ──

    #[test]
    fn message_mode_honors_flag_strictly() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        assert!(!gate.on_update(false));
        assert!(gate.on_update(true));
        assert!(!gate.on_update(false));
    }

    #[test]
    fn message_mode_is_never_due() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let start = Instant::now();
        for i in 0..100 {
            assert!(!gate.due(start + Duration::from_secs(i)));
        }
    }

    // ── Periodic gate ──

    #[test]
    fn periodic_mode_ignores_update_flag() {
        let mut gate = RenderGate::new(RenderMode::Periodic, 15);
        assert!(!gate.on_update(true));
        assert!(!gate.on_update(false));
    }

    #[test]
    fn periodic_first_check_fires() {
        let mut gate = RenderGate::new(RenderMode::Periodic, 15);
        assert!(gate.due(Instant::now()));
    }

    #[test]
    fn periodic_rate_over_interval() {
        // 15 renders/sec polled every millisecond for 1 simulated second:
        // floor(R*T) ± 1.
        let mut gate = RenderGate::new(RenderMode::Periodic, 15);
        let start = Instant::now();
        let mut renders = 0u32;
        for ms in 0..1000 {
            if gate.due(start + Duration::from_millis(ms)) {
                renders += 1;
            }
        }
        assert!((14..=16).contains(&renders), "got {renders} renders");
    }

    #[test]
    fn periodic_not_due_between_deadlines() {
        let mut gate = RenderGate::new(RenderMode::Periodic, 10); // 100ms interval
        let start = Instant::now();
        assert!(gate.due(start));
        assert!(!gate.due(start + Duration::from_millis(50)));
        assert!(gate.due(start + Duration::from_millis(100)));
    }

    #[test]
    fn periodic_skips_missed_intervals() {
        let mut gate = RenderGate::new(RenderMode::Periodic, 10); // 100ms interval
        let start = Instant::now();
        assert!(gate.due(start));

        // The loop stalls for 1 second; only one catch-up render fires.
        let late = start + Duration::from_secs(1);
        assert!(gate.due(late));
        assert!(!gate.due(late + Duration::from_millis(1)));
        assert!(gate.due(late + Duration::from_millis(100)));
    }

    // ── Poll interval ──

    #[test]
    fn poll_interval_capped_for_message_mode() {
        let gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        assert_eq!(gate.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn poll_interval_tracks_fast_periodic_rate() {
        let gate = RenderGate::new(RenderMode::Periodic, 20); // 50ms interval
        assert_eq!(gate.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn poll_interval_capped_for_slow_periodic_rate() {
        let gate = RenderGate::new(RenderMode::Periodic, 1); // 1s interval
        assert_eq!(gate.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn zero_rate_does_not_panic() {
        let gate = RenderGate::new(RenderMode::Periodic, 0);
        assert!(gate.poll_interval() > Duration::ZERO);
    }
}
