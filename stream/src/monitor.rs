//! # Sample Clock Monitor
//!
//! Measures the audio master clock against the USB frame clock to produce
//! the rate feedback value.
//!
//! A free-running 32-bit counter is clocked by the master clock and latched
//! by the start-of-frame signal. Every frame boundary the difference to the
//! previous latch is accumulated; after 32 differences the sum is encoded as
//! a [`FeedbackSample`] and the window restarts.
//!
//! ```text
//!   SOF      SOF      SOF            SOF
//!    |--d0----|--d1----|-- ... --d31--|
//!    ^ baseline                       ^ encode(d0 + .. + d31), restart
//! ```
//!
//! Counter wraparound is handled by modular subtraction. A monitor that never
//! sees a frame boundary simply never marks feedback valid.

use isodac_uac::feedback::FEEDBACK_WINDOW_FRAMES;
use isodac_uac::FeedbackSample;

use crate::state::AudioStream;

/// Hardware counter latched on start-of-frame
pub trait CaptureTimer {
    /// Resets the counter and enables the frame-boundary interrupt
    fn arm(&mut self);
    /// Stops the counter and disables the frame-boundary interrupt
    fn disarm(&mut self);
}

/// Ticks elapsed between two latches of a wrapping 32-bit counter
#[inline]
pub const fn counter_delta(last: u32, value: u32) -> u32 {
    value.wrapping_sub(last)
}

/// Frame clock capture accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClockCapture {
    last_counter: u32,
    accumulated_delta: u32,
    window_count: u32,
    first_sample: bool,
}

impl FrameClockCapture {
    pub const fn new() -> Self {
        Self {
            last_counter: 0,
            accumulated_delta: 0,
            window_count: 0,
            first_sample: true,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records one frame-boundary latch.
    ///
    /// Returns the encoded feedback when this latch completes a window.
    pub fn capture(&mut self, counter: u32) -> Option<FeedbackSample> {
        if self.first_sample {
            self.first_sample = false;
            self.last_counter = counter;
            return None;
        }

        let delta = counter_delta(self.last_counter, counter);
        self.last_counter = counter;
        self.accumulated_delta = self.accumulated_delta.wrapping_add(delta);

        if self.window_count == FEEDBACK_WINDOW_FRAMES - 1 {
            let sample = FeedbackSample::from_ticks(self.accumulated_delta);
            self.accumulated_delta = 0;
            self.window_count = 0;
            Some(sample)
        } else {
            self.window_count += 1;
            None
        }
    }

    pub fn accumulated_delta(&self) -> u32 {
        self.accumulated_delta
    }

    /// Differences accumulated in the current window
    pub fn window_count(&self) -> u32 {
        self.window_count
    }

    pub fn is_first_sample(&self) -> bool {
        self.first_sample
    }
}

impl Default for FrameClockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioStream {
    /// Starts frame interval measurement
    ///
    /// Clears the accumulator and invalidates any previous feedback before
    /// arming the timer.
    pub fn start_capture<T: CaptureTimer>(&self, timer: &mut T) {
        self.shared.lock(|s| {
            s.capture.reset();
            s.feedback_valid = false;
            s.capture_armed = true;
            timer.arm();
        });
        log::debug!("sof capture started");
    }

    /// Stops frame interval measurement
    pub fn stop_capture<T: CaptureTimer>(&self, timer: &mut T) {
        self.shared.lock(|s| {
            timer.disarm();
            s.capture_armed = false;
            s.feedback_valid = false;
        });
        log::debug!("sof capture stopped");
    }

    /// Frame-boundary interrupt, with the counter value latched at the boundary
    pub fn on_frame_boundary(&self, counter: u32) {
        let completed = self.shared.lock(|s| {
            if !s.capture_armed {
                return None;
            }
            let sample = s.capture.capture(counter)?;
            s.feedback = sample;
            s.feedback_valid = true;
            Some(sample)
        });

        if let Some(sample) = completed {
            self.stats().record_feedback_window();
            log::trace!("feedback window complete: {:#08x}", sample.value());
        }

        #[cfg(feature = "trace-frames")]
        log::trace!("sof counter {:#010x}", counter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;

    #[derive(Default)]
    struct MockTimer {
        armed: bool,
        arms: u32,
    }

    impl CaptureTimer for MockTimer {
        fn arm(&mut self) {
            self.armed = true;
            self.arms += 1;
        }

        fn disarm(&mut self) {
            self.armed = false;
        }
    }

    fn expected(deltas: &[u32]) -> u32 {
        let sum = deltas.iter().fold(0u32, |acc, d| acc.wrapping_add(*d));
        (sum << 1) & 0xFF_FFFF
    }

    #[test]
    fn test_wraparound_delta() {
        assert_eq!(counter_delta(0xFFFF_FFF0, 0x0000_000A), 26);
        assert_eq!(counter_delta(100, 250), 150);
        assert_eq!(counter_delta(7, 7), 0);
    }

    #[test]
    fn test_window_encodes_sum_of_32_deltas() {
        let mut capture = FrameClockCapture::new();
        let deltas: [u32; 32] = core::array::from_fn(|i| 12_288 + (i as u32 % 3));

        let mut counter = 1_000u32;
        assert_eq!(capture.capture(counter), None);
        let mut result = None;
        for (i, delta) in deltas.iter().enumerate() {
            counter = counter.wrapping_add(*delta);
            result = capture.capture(counter);
            if i < 31 {
                assert!(result.is_none());
            }
        }

        let sample = result.expect("window complete");
        assert_eq!(sample.value(), expected(&deltas));
        assert_eq!(capture.window_count(), 0);
        assert_eq!(capture.accumulated_delta(), 0);
    }

    #[test]
    fn test_window_independent_of_wrap_position() {
        let deltas = [12_290u32; 32];
        for start in [0u32, 0xFFFF_0000, 0xFFFF_FFFF - 5 * 12_290, u32::MAX] {
            let mut capture = FrameClockCapture::new();
            let mut counter = start;
            capture.capture(counter);
            let mut result = None;
            for delta in deltas {
                counter = counter.wrapping_add(delta);
                result = capture.capture(counter);
            }
            assert_eq!(result.map(|s| s.value()), Some(expected(&deltas)));
        }
    }

    #[test]
    fn test_stream_marks_feedback_valid() {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        let mut timer = MockTimer::default();

        // Not armed: latches are ignored
        stream.on_frame_boundary(5);
        assert!(stream.shared.lock(|s| s.capture.is_first_sample()));

        stream.start_capture(&mut timer);
        assert!(timer.armed);

        let mut counter = 0u32;
        for _ in 0..32 {
            stream.on_frame_boundary(counter);
            counter = counter.wrapping_add(12_288);
        }
        assert!(!stream.feedback_valid());

        stream.on_frame_boundary(counter);
        let sample = stream.feedback().expect("valid after 32 deltas");
        assert_eq!(sample.whole(), 48);
        assert_eq!(stream.stats().snapshot().feedback_windows, 1);
    }

    #[test]
    fn test_restart_invalidates_feedback() {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        let mut timer = MockTimer::default();

        stream.start_capture(&mut timer);
        for i in 0..33u32 {
            stream.on_frame_boundary(i * 12_288);
        }
        assert!(stream.feedback_valid());

        stream.stop_capture(&mut timer);
        assert!(!timer.armed);
        assert!(!stream.feedback_valid());

        stream.start_capture(&mut timer);
        assert_eq!(timer.arms, 2);
        for i in 0..10u32 {
            stream.on_frame_boundary(i * 12_288);
        }
        assert_eq!(stream.feedback(), None);
    }
}
