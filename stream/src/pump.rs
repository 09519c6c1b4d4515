//! # Buffer Pump
//!
//! The only consumer of the ingress queue. Parks until the DMA reports that
//! a half of the double buffer has been transmitted, then refills that half
//! from the queue.
//!
//! Reads never wait. If fewer bytes are queued than one half needs, the half
//! is left as it is and the DMA replays its previous contents (or silence).
//! The glitch is bounded to one half-period: the next wake gets a fresh
//! chance to catch up.

use crate::buffer::{DoubleBuffer, Half, HalfTransfer};
use crate::config::BUFFER_BYTES;
use crate::error::AudioError;
use crate::state::AudioStream;

/// What the pump did with one wake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Half refilled with fresh samples
    Filled(Half),
    /// Too few bytes queued; half left untouched
    Underrun(Half),
}

/// Refills the DMA double buffer from the ingress queue
pub struct BufferPump<'a, const B: usize = BUFFER_BYTES> {
    stream: &'a AudioStream,
    buffer: &'a mut DoubleBuffer<B>,
}

impl<'a, const B: usize> BufferPump<'a, B> {
    /// Binds the pump to the stream and the buffer the DMA transmits from
    pub fn new(stream: &'a AudioStream, buffer: &'a mut DoubleBuffer<B>) -> Result<Self, AudioError> {
        if stream.config().buffer_bytes() != B {
            return Err(AudioError::InvalidConfig);
        }
        Ok(Self { stream, buffer })
    }

    pub fn buffer(&self) -> &DoubleBuffer<B> {
        self.buffer
    }

    /// Handles one half-transfer wake
    pub fn service(&mut self, transfer: HalfTransfer) -> PumpOutcome {
        let half = transfer.half;
        let dest = self.buffer.half_mut(half);
        let len = transfer.len.min(dest.len());

        if self.stream.take_samples(&mut dest[..len]) {
            self.stream.stats().record_fill();
            PumpOutcome::Filled(half)
        } else {
            self.stream.stats().record_underrun();
            log::trace!("pump underrun on {:?} half", half);
            PumpOutcome::Underrun(half)
        }
    }

    /// Services a wake that is already pending, without parking
    pub fn try_step(&mut self) -> Option<PumpOutcome> {
        let transfer = self.stream.pump_signal().try_take()?;
        Some(self.service(transfer))
    }

    /// Parks until the next half-transfer, then services it
    pub async fn step(&mut self) -> PumpOutcome {
        let transfer = self.stream.pump_signal().wait().await;
        self.service(transfer)
    }

    /// Pump task body
    pub async fn run(&mut self) -> ! {
        log::debug!("buffer pump running");
        loop {
            self.step().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;
    use crate::endpoint::{EndpointConfig, EndpointDriver};

    struct NullUsb;

    impl EndpointDriver for NullUsb {
        fn init_endpoint(&mut self, _ep: u8, _config: &EndpointConfig) -> Result<(), AudioError> {
            Ok(())
        }

        fn start_receive(&mut self, _ep: u8, _max_len: usize) -> Result<(), AudioError> {
            Ok(())
        }

        fn start_transmit(&mut self, _ep: u8, _data: &[u8]) -> Result<(), AudioError> {
            Ok(())
        }
    }

    fn playing_stream() -> AudioStream {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        stream.shared.lock(|s| s.playback = true);
        stream
    }

    #[test]
    fn test_fills_vacated_half_in_order() {
        let stream = playing_stream();
        let mut usb = NullUsb;
        let packet: [u8; 192] = core::array::from_fn(|i| i as u8);
        stream.on_data_slot(&mut usb, &packet).expect("queued");

        let mut buffer: DoubleBuffer = DoubleBuffer::new();
        let mut pump = BufferPump::new(&stream, &mut buffer).expect("sizes match");

        stream.on_half_transfer(Half::Second);
        assert_eq!(pump.try_step(), Some(PumpOutcome::Filled(Half::Second)));
        assert_eq!(pump.buffer().half(Half::Second), &packet[..]);
        assert!(pump.buffer().half(Half::First).iter().all(|&b| b == 0));
        assert_eq!(stream.queued_bytes(), 0);
    }

    #[test]
    fn test_underrun_leaves_half_untouched() {
        let stream = playing_stream();
        let mut usb = NullUsb;

        let mut buffer: DoubleBuffer = DoubleBuffer::new();
        buffer.half_mut(Half::First).fill(0x55);
        let mut pump = BufferPump::new(&stream, &mut buffer).expect("sizes match");

        stream.on_data_slot(&mut usb, &[0xAA; 100]).expect("queued");
        stream.on_half_transfer(Half::First);
        assert_eq!(pump.try_step(), Some(PumpOutcome::Underrun(Half::First)));
        assert!(pump.buffer().half(Half::First).iter().all(|&b| b == 0x55));
        assert_eq!(stream.queued_bytes(), 100);

        // Host catches up before the next half-period
        stream.on_data_slot(&mut usb, &[0xAA; 100]).expect("queued");
        stream.on_half_transfer(Half::Second);
        assert_eq!(pump.try_step(), Some(PumpOutcome::Filled(Half::Second)));
        assert_eq!(stream.queued_bytes(), 8);

        let stats = stream.stats().snapshot();
        assert_eq!(stats.underruns, 1);
        assert_eq!(stats.fills, 1);
    }

    #[test]
    fn test_no_wake_no_work() {
        let stream = playing_stream();
        let mut buffer: DoubleBuffer = DoubleBuffer::new();
        let mut pump = BufferPump::new(&stream, &mut buffer).expect("sizes match");
        assert_eq!(pump.try_step(), None);
    }

    #[test]
    fn test_wake_before_park_not_lost() {
        let stream = playing_stream();
        let mut usb = NullUsb;
        stream.on_data_slot(&mut usb, &[3u8; 192]).expect("queued");

        let mut buffer: DoubleBuffer = DoubleBuffer::new();
        let mut pump = BufferPump::new(&stream, &mut buffer).expect("sizes match");

        stream.on_half_transfer(Half::First);
        let outcome = pollster::block_on(pump.step());
        assert_eq!(outcome, PumpOutcome::Filled(Half::First));
    }

    #[test]
    fn test_buffer_size_must_match_config() {
        let stream = playing_stream();
        let mut buffer = DoubleBuffer::<64>::new();
        assert!(matches!(
            BufferPump::new(&stream, &mut buffer),
            Err(AudioError::InvalidConfig)
        ));
    }
}
