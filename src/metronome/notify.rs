// Notification bridge - re-aligns the coarse poll cadence to the audio timeline
//
// Beat callbacks cannot fire from the audio callback (the scheduler never
// hears back from it), and the poll timer is too jittery to time UI feedback.
// Instead every scheduled beat arms one entry here, due at the beat's
// already-computed audio-clock time; the poll loop drains due entries. The
// queue is owned by the scheduler, so stop() can deterministically drop
// armed notifications instead of leaving stray one-shot timers to fire.

use crate::metronome::meter::{BeatAccent, PlaybackPosition};
use std::collections::VecDeque;

/// One armed beat notification
/// Carries a frozen snapshot captured at emission time; firing never reads
/// live scheduler state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatNotification {
    /// Audio-clock time at which the beat sounds
    pub fire_time: f64,
    pub position: PlaybackPosition,
    pub accent: BeatAccent,
}

/// Pending notifications in scheduling order
///
/// Beats are armed in strictly increasing time order, so the front entry is
/// always the earliest due.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: VecDeque<BeatNotification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, notification: BeatNotification) {
        self.pending.push_back(notification);
    }

    /// Fire every notification due at or before `now`, in order
    /// Returns the number fired.
    pub fn fire_due<F>(&mut self, now: f64, notify: &mut F) -> usize
    where
        F: FnMut(PlaybackPosition, BeatAccent) + ?Sized,
    {
        let mut fired = 0;
        while let Some(due) = self.pending.front().copied() {
            if due.fire_time > now {
                break;
            }
            self.pending.pop_front();
            notify(due.position, due.accent);
            fired += 1;
        }
        fired
    }

    /// Drop everything armed; nothing fires afterwards
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(fire_time: f64, bar: u32, beat: u32) -> BeatNotification {
        BeatNotification {
            fire_time,
            position: PlaybackPosition { bar, beat },
            accent: BeatAccent::Normal,
        }
    }

    #[test]
    fn test_fires_only_due_entries() {
        let mut queue = NotificationQueue::new();
        queue.push(beat(0.05, 1, 1));
        queue.push(beat(0.55, 1, 2));
        queue.push(beat(1.05, 1, 3));

        let mut fired = Vec::new();
        let count = queue.fire_due(0.6, &mut |pos, _| fired.push(pos.beat));

        assert_eq!(count, 2);
        assert_eq!(fired, vec![1, 2]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_fires_in_order() {
        let mut queue = NotificationQueue::new();
        for i in 0..4 {
            queue.push(beat(i as f64 * 0.5, 1, i + 1));
        }

        let mut fired = Vec::new();
        queue.fire_due(10.0, &mut |pos, _| fired.push(pos.beat));
        assert_eq!(fired, vec![1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_due_exactly_at_now_fires() {
        let mut queue = NotificationQueue::new();
        queue.push(beat(0.5, 1, 1));

        let count = queue.fire_due(0.5, &mut |_, _| {});
        assert_eq!(count, 1);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut queue = NotificationQueue::new();
        queue.push(beat(0.05, 1, 1));
        queue.push(beat(0.55, 1, 2));

        queue.clear();
        assert!(queue.is_empty());

        let count = queue.fire_due(10.0, &mut |_, _| panic!("must not fire"));
        assert_eq!(count, 0);
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let mut queue = NotificationQueue::new();
        queue.push(BeatNotification {
            fire_time: 0.0,
            position: PlaybackPosition { bar: 3, beat: 2 },
            accent: BeatAccent::Accent,
        });

        let mut seen = None;
        queue.fire_due(0.0, &mut |pos, accent| seen = Some((pos, accent)));

        let (pos, accent) = seen.expect("one notification fired");
        assert_eq!(pos, PlaybackPosition { bar: 3, beat: 2 });
        assert_eq!(accent, BeatAccent::Accent);
    }
}
