//! Notification Window Queue
//!
//! Bounded, ordered stack of popups. The oldest popup is evicted to make room
//! and every remaining popup is repacked toward the anchor after a removal.

use std::collections::VecDeque;

use eyre::Result;
use tracing::debug;

use super::geometry::{Rect, StackLayout};
use super::host::WindowHost;
use crate::config::PopupConfig;
use crate::domain::Notification;

/// One on-screen popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: u64,
    pub notification_id: String,
    pub rect: Rect,
}

/// Result of showing a popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub slot: u64,
    /// The oldest popup, closed to make room
    pub evicted: Option<Slot>,
}

/// Popups ordered oldest first; the newest sits nearest the anchor
pub struct NotificationWindowQueue<H: WindowHost> {
    host: H,
    capacity: usize,
    layout: StackLayout,
    slots: VecDeque<Slot>,
    next_id: u64,
}

impl<H: WindowHost> NotificationWindowQueue<H> {
    pub fn new(host: H, capacity: usize, layout: StackLayout) -> Self {
        let capacity = capacity.max(1);
        debug!(capacity, "NotificationWindowQueue::new: called");
        Self {
            host,
            capacity,
            layout,
            slots: VecDeque::with_capacity(capacity),
            next_id: 1,
        }
    }

    pub fn from_config(host: H, config: &PopupConfig) -> Self {
        Self::new(host, config.capacity, StackLayout::from_config(config))
    }

    /// Open a popup for `notification`, evicting the oldest when full
    pub fn show(&mut self, notification: &Notification) -> Result<Shown> {
        debug!(id = %notification.id, len = self.slots.len(), "NotificationWindowQueue::show: called");

        let evicted = if self.slots.len() >= self.capacity {
            let oldest = self.slots.pop_front();
            if let Some(oldest) = &oldest {
                debug!(slot = oldest.id, "NotificationWindowQueue::show: evicting oldest");
                self.host.close(oldest.id);
            }
            oldest
        } else {
            None
        };

        let id = self.next_id;
        let rect = self.layout.rect_for(0);
        if let Err(e) = self.host.open(id, notification, rect) {
            self.repack();
            return Err(e);
        }
        self.next_id += 1;
        self.slots.push_back(Slot {
            id,
            notification_id: notification.id.clone(),
            rect,
        });
        self.repack();

        Ok(Shown { slot: id, evicted })
    }

    /// Forget a slot whose window is already closed, then repack
    pub fn remove(&mut self, slot: u64) -> Option<Slot> {
        debug!(slot, "NotificationWindowQueue::remove: called");
        let index = self.slots.iter().position(|s| s.id == slot)?;
        let removed = self.slots.remove(index);
        self.repack();
        removed
    }

    /// Close a slot's window, then remove it
    pub fn dismiss(&mut self, slot: u64) -> Option<Slot> {
        debug!(slot, "NotificationWindowQueue::dismiss: called");
        if !self.slots.iter().any(|s| s.id == slot) {
            return None;
        }
        self.host.close(slot);
        self.remove(slot)
    }

    /// Place every slot at the rectangle for its index from the newest
    fn repack(&mut self) {
        for (index, slot) in self.slots.iter_mut().rev().enumerate() {
            let rect = self.layout.rect_for(index);
            if slot.rect != rect {
                slot.rect = rect;
                self.host.place(slot.id, rect);
            }
        }
    }

    /// Slots oldest first
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::host::mock::{HostCall, RecordingHost};
    use proptest::prelude::*;

    fn queue(capacity: usize) -> NotificationWindowQueue<RecordingHost> {
        NotificationWindowQueue::new(RecordingHost::default(), capacity, StackLayout::default())
    }

    fn n(id: &str) -> Notification {
        Notification::new(id, id, "body")
    }

    fn assert_consistent(queue: &NotificationWindowQueue<RecordingHost>) {
        let layout = StackLayout::default();
        let slots: Vec<_> = queue.slots().collect();
        assert!(slots.len() <= queue.capacity());
        for (index, slot) in slots.iter().rev().enumerate() {
            assert_eq!(slot.rect, layout.rect_for(index), "slot {} out of place", slot.id);
        }
    }

    #[test]
    fn test_newest_nearest_anchor() {
        let mut q = queue(5);
        q.show(&n("a")).unwrap();
        q.show(&n("b")).unwrap();

        let ids: Vec<_> = q.slots().map(|s| s.notification_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_consistent(&q);
        assert_eq!(q.slots().last().unwrap().rect.y, 900);
    }

    #[test]
    fn test_eviction_closes_oldest() {
        let mut q = queue(5);
        for id in ["a", "b", "c", "d", "e"] {
            assert!(q.show(&n(id)).unwrap().evicted.is_none());
        }

        let shown = q.show(&n("f")).unwrap();
        let evicted = shown.evicted.unwrap();
        assert_eq!(evicted.notification_id, "a");
        assert_eq!(q.len(), 5);
        assert_eq!(q.host().closes(), vec![evicted.id]);
        let ids: Vec<_> = q.slots().map(|s| s.notification_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d", "e", "f"]);
        assert_consistent(&q);
    }

    #[test]
    fn test_middle_removal_repacks() {
        let mut q = queue(5);
        let slots: Vec<u64> = ["a", "b", "c"].iter().map(|id| q.show(&n(id)).unwrap().slot).collect();

        let removed = q.remove(slots[1]).unwrap();
        assert_eq!(removed.notification_id, "b");
        assert_consistent(&q);

        // "a" moved down into "b"'s old place; "c" did not move
        let a = q.slots().next().unwrap();
        assert_eq!(a.rect, StackLayout::default().rect_for(1));
        assert_eq!(
            q.host().calls.last(),
            Some(&HostCall::Place {
                slot: slots[0],
                rect: StackLayout::default().rect_for(1)
            })
        );
        // remove() never closes the window itself
        assert!(q.host().closes().is_empty());
    }

    #[test]
    fn test_dismiss_closes_then_removes() {
        let mut q = queue(5);
        let slot = q.show(&n("a")).unwrap().slot;

        assert!(q.dismiss(slot).is_some());
        assert_eq!(q.host().closes(), vec![slot]);
        assert!(q.is_empty());

        assert!(q.dismiss(slot).is_none());
        assert!(q.remove(slot).is_none());
        assert_eq!(q.host().closes().len(), 1);
    }

    #[test]
    fn test_open_failure_keeps_queue_consistent() {
        let mut q = queue(2);
        q.show(&n("a")).unwrap();
        q.show(&n("b")).unwrap();

        let mut failing = queue(2);
        failing.host.fail_open = true;
        assert!(failing.show(&n("x")).is_err());
        assert!(failing.is_empty());

        q.host.fail_open = true;
        assert!(q.show(&n("c")).is_err());
        assert_eq!(q.len(), 1);
        assert_consistent(&q);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut q = queue(0);
        q.show(&n("a")).unwrap();
        q.show(&n("b")).unwrap();
        assert_eq!(q.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Show,
        Remove(usize),
        Dismiss(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Show),
            1 => (0usize..8).prop_map(Op::Remove),
            1 => (0usize..8).prop_map(Op::Dismiss),
        ]
    }

    proptest! {
        #[test]
        fn prop_length_bounded_and_rects_consistent(
            capacity in 1usize..7,
            ops in proptest::collection::vec(op_strategy(), 1..60)
        ) {
            let mut q = queue(capacity);
            for (i, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Show => {
                        q.show(&n(&format!("n{i}"))).unwrap();
                    }
                    Op::Remove(pick) => {
                        let ids: Vec<u64> = q.slots().map(|s| s.id).collect();
                        if !ids.is_empty() {
                            q.remove(ids[pick % ids.len()]);
                        }
                    }
                    Op::Dismiss(pick) => {
                        let ids: Vec<u64> = q.slots().map(|s| s.id).collect();
                        if !ids.is_empty() {
                            q.dismiss(ids[pick % ids.len()]);
                        }
                    }
                }
                prop_assert!(q.len() <= capacity);
                let layout = StackLayout::default();
                for (index, slot) in q.slots().collect::<Vec<_>>().iter().rev().enumerate() {
                    prop_assert_eq!(slot.rect, layout.rect_for(index));
                }
            }
        }
    }
}
