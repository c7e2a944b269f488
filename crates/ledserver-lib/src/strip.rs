//! Frame buffer and strip driver interface.
//!
//! [`FrameBuffer`] owns the in-memory color state for the strip; its length
//! is fixed at startup and every write is bounds-checked. [`StripDriver`] is
//! the hardware sink: the real implementation wraps a DMA/PWM LED library
//! and lives outside this crate. Tests use [`mock::MockStrip`].

use std::fmt;

// ── Error type ──

/// Strip driver errors.
#[derive(Debug)]
pub enum StripError {
    /// Hardware could not be acquired at startup. Fatal.
    InitFailed(String),
    /// A commit to hardware failed. Transient; the serve loop continues.
    RenderFailed(String),
}

impl fmt::Display for StripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripError::InitFailed(e) => write!(f, "Strip init failed: {e}"),
            StripError::RenderFailed(e) => write!(f, "Render failed: {e}"),
        }
    }
}

impl std::error::Error for StripError {}

pub type Result<T> = std::result::Result<T, StripError>;

// ── Frame buffer ──

/// In-memory color state for the strip, one packed color value per pixel.
///
/// The channel layout of the packed value is owned by the driver; the buffer
/// stores whatever the wire delivers. There is exactly one writer (the serve
/// loop) and one reader (the render step), both on the same thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<u32>,
}

impl FrameBuffer {
    /// Create a buffer of `len` pixels, all off.
    pub fn new(len: usize) -> Self {
        FrameBuffer {
            pixels: vec![0; len],
        }
    }

    /// Number of pixels. Immutable for the process lifetime.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Set pixel `index` to `color` if `index` is in bounds.
    ///
    /// Returns whether the write landed. An out-of-range index is silently
    /// dropped — there is no back-channel to the sender, so a stale or
    /// malicious index must never crash or stall the service. The returned
    /// bool feeds the `ignored` counter only.
    pub fn assign(&mut self, index: usize, color: u32) -> bool {
        match self.pixels.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// Set every pixel to the off color.
    ///
    /// Used at startup (deterministic known state) and at shutdown (the
    /// hardware must not retain stale light after the process exits).
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Raw pixel values, consumed by the driver during render.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

// ── Driver trait ──

/// Hardware sink for the frame buffer.
///
/// Acquired once at startup, released exactly once at shutdown. `render`
/// either completes or fails before returning; no other timing guarantee is
/// assumed.
pub trait StripDriver {
    /// Acquire the hardware. Failure here aborts startup.
    fn init() -> Result<Self>
    where
        Self: Sized;

    /// Commit the buffer to hardware.
    fn render(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// Release the hardware. Idempotent.
    fn finish(&mut self);
}

// ── Mock driver ──

pub mod mock {
    use super::*;

    /// In-memory driver for unit tests. Records every rendered frame and
    /// counts `finish` calls; `fail_render` injects render failures.
    pub struct MockStrip {
        /// Snapshot of the buffer at each render call, in order.
        pub frames: Vec<Vec<u32>>,
        /// Number of times `finish` was called.
        pub finish_calls: u32,
        /// If true, `render` returns an error (the frame is still recorded).
        pub fail_render: bool,
    }

    impl Default for MockStrip {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockStrip {
        pub fn new() -> Self {
            MockStrip {
                frames: Vec::new(),
                finish_calls: 0,
                fail_render: false,
            }
        }

        /// The most recently rendered frame.
        pub fn last_frame(&self) -> Option<&[u32]> {
            self.frames.last().map(Vec::as_slice)
        }
    }

    impl StripDriver for MockStrip {
        fn init() -> Result<Self> {
            Ok(Self::new())
        }

        fn render(&mut self, frame: &FrameBuffer) -> Result<()> {
            self.frames.push(frame.pixels().to_vec());
            if self.fail_render {
                return Err(StripError::RenderFailed("injected failure".into()));
            }
            Ok(())
        }

        fn finish(&mut self) {
            self.finish_calls += 1;
        }
    }
}
