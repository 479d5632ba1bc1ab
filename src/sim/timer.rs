/// Deferred events on a caller-supplied millisecond clock.
///
/// The controller schedules `TimerKind`s here and drains the due ones each
/// frame. `cancel_all` on teardown leaves nothing to fire against stale
/// state.

use super::event::TimerKind;

#[derive(Clone, Debug)]
struct Pending {
    seq: u64,
    due_ms: u64,
    kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler { pending: Vec::new(), next_seq: 0 }
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, kind: TimerKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending { seq, due_ms: now_ms.saturating_add(delay_ms), kind });
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every timer due at `now_ms`, earliest first.
    /// Ties keep scheduling order.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<TimerKind> {
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.due_ms <= now_ms {
                due.push(p.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|p| (p.due_ms, p.seq));
        due.into_iter().map(|p| p.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
