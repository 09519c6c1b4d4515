//! # Audio Event Broadcast
//!
//! Interrupt handlers raise event flags; the control task consumes them.
//! Flags raised while nobody is waiting accumulate and are delivered together
//! on the next wait, so a notification is never lost, and raising a flag that
//! is already pending does not produce a second delivery.

use bitflags::bitflags;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::lock::IrqMutex;

bitflags! {
    /// Audio events
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AudioEvents: u32 {
        /// Playback started or stopped
        const PLAYBACK = 1 << 1;
        /// Channel mute changed
        const MUTE = 1 << 2;
        /// Channel volume changed
        const VOLUME = 1 << 3;
        /// USB bus state changed
        const USB_STATE = 1 << 4;
    }
}

/// Event flag source with a single listener
pub struct EventSource {
    pending: IrqMutex<AudioEvents>,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl EventSource {
    pub const fn new() -> Self {
        Self {
            pending: IrqMutex::new(AudioEvents::empty()),
            wake: Signal::new(),
        }
    }

    /// Raises `flags` and wakes the listener. Callable from interrupt context.
    pub fn broadcast(&self, flags: AudioEvents) {
        self.pending.lock(|pending| pending.insert(flags));
        self.wake.signal(());
        log::trace!("audio event {:?}", flags);
    }

    /// Gets and clears the pending flags without waiting
    pub fn take(&self) -> AudioEvents {
        self.pending.lock(core::mem::take)
    }

    /// Flags raised but not yet taken
    pub fn pending(&self) -> AudioEvents {
        self.pending.lock(|pending| *pending)
    }

    /// Waits until at least one flag is pending, then gets and clears them
    pub async fn wait(&self) -> AudioEvents {
        loop {
            let flags = self.take();
            if !flags.is_empty() {
                return flags;
            }
            self.wake.wait().await;
        }
    }
}

impl Default for EventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_accumulate() {
        let events = EventSource::new();
        events.broadcast(AudioEvents::MUTE);
        events.broadcast(AudioEvents::VOLUME);
        events.broadcast(AudioEvents::MUTE);

        assert_eq!(events.take(), AudioEvents::MUTE | AudioEvents::VOLUME);
        assert!(events.take().is_empty());
    }

    #[test]
    fn test_wait_sees_earlier_broadcast() {
        let events = EventSource::new();
        events.broadcast(AudioEvents::PLAYBACK);

        let flags = pollster::block_on(events.wait());
        assert_eq!(flags, AudioEvents::PLAYBACK);
        assert!(events.pending().is_empty());
    }

    #[test]
    fn test_stale_wake_does_not_deliver_empty() {
        let events = EventSource::new();
        events.broadcast(AudioEvents::USB_STATE);
        // Consumed without waiting; the wake signal is still set
        assert_eq!(events.take(), AudioEvents::USB_STATE);

        events.broadcast(AudioEvents::VOLUME);
        let flags = pollster::block_on(events.wait());
        assert_eq!(flags, AudioEvents::VOLUME);
    }
}
