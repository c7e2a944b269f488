//! The update-ingestion-and-render loop.
//!
//! Single-threaded, blocking, sequential: one thread alternates between a
//! blocking receive and a hardware render. The frame buffer has one writer
//! and one reader, both here, so there are no locks. The only asynchronous
//! event is the shutdown flag, observed once per iteration.

use std::time::Instant;

use crate::lifecycle::{ShutdownFlag, Stats};
use crate::render::RenderGate;
use crate::strip::{FrameBuffer, StripDriver};
use crate::transport::DatagramSource;
use crate::wire;

/// Run the serve loop until `flag` requests a stop.
///
/// On entry the buffer is cleared and committed once so the strip starts in
/// a known state. On exit, teardown runs in a fixed order: clear the buffer,
/// issue one final render (failure swallowed — the process must terminate),
/// release the driver. The caller drops the source afterwards, so the strip
/// is dark before the socket closes.
///
/// Startup and teardown renders are not counted in [`Stats::renders`].
pub fn serve(
    frame: &mut FrameBuffer,
    source: &mut dyn DatagramSource,
    driver: &mut impl StripDriver,
    gate: &mut RenderGate,
    flag: &ShutdownFlag,
) -> Stats {
    let mut stats = Stats::default();
    // One byte past the wire limit so a limit-exceeding datagram is seen as
    // oversized instead of silently truncated to a valid length.
    let mut buf = vec![0u8; wire::MAX_DATAGRAM + 1];

    frame.clear();
    if let Err(e) = driver.render(frame) {
        log::warn!("[strip] startup render failed: {e}");
    }

    while flag.is_running() {
        match source.recv(&mut buf) {
            Ok(Some(n)) => {
                stats.received += 1;
                match wire::decode(&buf[..n]) {
                    Ok(update) => {
                        if frame.assign(update.index as usize, update.color) {
                            stats.applied += 1;
                        } else {
                            // Expected under stale or misconfigured senders;
                            // there is no back-channel to report it on.
                            stats.ignored += 1;
                            log::debug!(
                                "[frame] index {} out of range (strip length {})",
                                update.index,
                                frame.len()
                            );
                        }
                        if gate.on_update(update.render) {
                            render_step(driver, frame, &mut stats);
                        }
                    }
                    Err(e) => {
                        stats.rejected += 1;
                        log::warn!("[wire] discarding datagram: {e}");
                    }
                }
            }
            // Timed out or interrupted; fall through to the flag check.
            Ok(None) => {}
            Err(e) => {
                if flag.is_running() {
                    log::warn!("[transport] {e}");
                }
            }
        }

        if gate.due(Instant::now()) {
            render_step(driver, frame, &mut stats);
        }
    }

    frame.clear();
    let _ = driver.render(frame);
    driver.finish();

    stats
}

/// Commit the buffer. Hardware transients are logged, never fatal.
fn render_step(driver: &mut impl StripDriver, frame: &FrameBuffer, stats: &mut Stats) {
    match driver.render(frame) {
        Ok(()) => stats.renders += 1,
        Err(e) => log::warn!("[strip] {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderMode;
    use crate::strip::mock::MockStrip;
    use crate::transport::mock::{Event, MockSource};
    use crate::wire::Update;

    fn datagram(index: u32, color: u32, render: bool) -> Event {
        Event::Datagram(wire::encode(&Update {
            index,
            color,
            render,
        }))
    }

    fn run(strip_len: usize, events: Vec<Event>, gate: &mut RenderGate) -> (Stats, MockStrip) {
        let flag = ShutdownFlag::new();
        let mut source = MockSource::new(events).stop_when_drained(flag.clone());
        let mut driver = MockStrip::new();
        let mut frame = FrameBuffer::new(strip_len);
        let stats = serve(&mut frame, &mut source, &mut driver, gate, &flag);
        (stats, driver)
    }

    #[test]
    fn startup_render_commits_cleared_buffer() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let (stats, driver) = run(4, vec![], &mut gate);

        // Startup render + teardown render, neither counted.
        assert_eq!(stats.renders, 0);
        assert_eq!(driver.frames.len(), 2);
        assert!(driver.frames[0].iter().all(|&c| c == 0));
    }

    #[test]
    fn batch_renders_once_on_flagged_update() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let events = vec![
            datagram(0, 0x111111, false),
            datagram(1, 0x222222, false),
            datagram(2, 0x333333, false),
            datagram(3, 0x444444, true),
        ];
        let (stats, driver) = run(8, events, &mut gate);

        assert_eq!(stats.received, 4);
        assert_eq!(stats.applied, 4);
        assert_eq!(stats.renders, 1, "exactly one render for the batch");

        // frames[0] is the startup render; frames[1] is the batch commit.
        let committed = &driver.frames[1];
        assert_eq!(&committed[..4], &[0x111111, 0x222222, 0x333333, 0x444444]);
    }

    #[test]
    fn out_of_range_update_still_renders() {
        // Strip length 60: index 30 lands, index 99 is dropped but its
        // render request is still honored.
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let events = vec![
            datagram(30, 0xFF0000, true),
            datagram(99, 0x00FF00, true),
        ];
        let (stats, driver) = run(60, events, &mut gate);

        assert_eq!(stats.applied, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.renders, 2);

        let after_second = &driver.frames[2];
        assert_eq!(after_second[30], 0xFF0000);
        assert!(after_second.iter().enumerate().all(|(i, &c)| i == 30 || c == 0));
    }

    #[test]
    fn malformed_datagram_is_discarded_and_loop_continues() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let events = vec![
            Event::Datagram(vec![1, 2, 3]),
            datagram(0, 0xABCDEF, true),
        ];
        let (stats, driver) = run(4, events, &mut gate);

        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.renders, 1);
        assert_eq!(driver.frames[1][0], 0xABCDEF);
    }

    #[test]
    fn oversized_datagram_is_rejected_without_mutation() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let events = vec![Event::Datagram(vec![0u8; wire::MAX_DATAGRAM + 1])];
        let (stats, driver) = run(4, events, &mut gate);

        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.applied, 0);
        // Only startup and teardown renders, both all-off.
        assert!(driver.frames.iter().flatten().all(|&c| c == 0));
    }

    #[test]
    fn empty_datagram_is_rejected() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let (stats, _) = run(4, vec![Event::Datagram(vec![])], &mut gate);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn transient_receive_error_does_not_stop_the_loop() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let events = vec![
            Event::Error("connection reset".into()),
            datagram(1, 0x00FF00, true),
        ];
        let (stats, _) = run(4, events, &mut gate);

        assert_eq!(stats.received, 1);
        assert_eq!(stats.applied, 1);
    }

    #[test]
    fn render_failure_is_non_fatal() {
        let flag = ShutdownFlag::new();
        let mut source = MockSource::new(vec![
            datagram(0, 0x111111, true),
            datagram(1, 0x222222, true),
        ])
        .stop_when_drained(flag.clone());
        let mut driver = MockStrip::new();
        driver.fail_render = true;
        let mut frame = FrameBuffer::new(4);
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);

        let stats = serve(&mut frame, &mut source, &mut driver, &mut gate, &flag);

        assert_eq!(stats.applied, 2, "mutations proceed despite render failures");
        assert_eq!(stats.renders, 0);
        assert_eq!(driver.finish_calls, 1, "teardown still releases the strip");
    }

    #[test]
    fn teardown_clears_renders_and_releases_in_order() {
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);
        let events = vec![datagram(2, 0xFF00FF, true)];
        let (_, driver) = run(4, events, &mut gate);

        assert_eq!(driver.finish_calls, 1);
        let last = driver.last_frame().unwrap();
        assert!(last.iter().all(|&c| c == 0), "final render must be all-off");
    }

    #[test]
    fn stop_requested_before_start_still_tears_down() {
        let flag = ShutdownFlag::new();
        flag.request_stop();
        let mut source = MockSource::new(vec![datagram(0, 1, true)]);
        let mut driver = MockStrip::new();
        let mut frame = FrameBuffer::new(4);
        let mut gate = RenderGate::new(RenderMode::MessageTriggered, 15);

        let stats = serve(&mut frame, &mut source, &mut driver, &mut gate, &flag);

        assert_eq!(stats.received, 0, "loop body never runs");
        assert_eq!(driver.finish_calls, 1);
        assert_eq!(driver.frames.len(), 2, "startup and teardown renders only");
    }

    #[test]
    fn periodic_mode_renders_without_update_flags() {
        // 1000 renders/sec so the scripted timeouts comfortably cross
        // deadlines without real sleeping.
        let mut gate = RenderGate::new(RenderMode::Periodic, 1000);
        let events = vec![
            datagram(0, 0x111111, false),
            Event::Timeout,
            datagram(1, 0x222222, false),
            Event::Timeout,
        ];
        let (stats, _) = run(4, events, &mut gate);

        assert_eq!(stats.applied, 2);
        assert!(stats.renders >= 1, "periodic cadence must fire");
    }
}
