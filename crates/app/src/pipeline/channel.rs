//! Bounded decision mailbox between the classifier producer and the
//! actuation consumer.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use infer_core::Classification;

/// Fixed-capacity, overwrite-on-full buffer of classifications.
///
/// `publish` never blocks and never fails: when the buffer is full the oldest
/// entry is evicted first. `try_take` never blocks and removes at most the
/// oldest retained entry. Retained entries keep FIFO order. Exactly one
/// producer and one consumer share the channel; neither waits on the other
/// beyond the short critical section.
#[derive(Clone)]
pub(crate) struct DecisionChannel {
    inner: Arc<Mutex<VecDeque<Classification>>>,
    capacity: usize,
}

impl DecisionChannel {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn publish(&self, value: Classification) {
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() == self.capacity {
            queue.pop_front();
            metrics::counter!("gate_decisions_evicted_total").increment(1);
        }
        queue.push_back(value);
        metrics::gauge!("gate_channel_depth").set(queue.len() as f64);
    }

    pub(crate) fn try_take(&self) -> Option<Classification> {
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let value = queue.pop_front();
        metrics::gauge!("gate_channel_depth").set(queue.len() as f64);
        value
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infer_core::Classification::{Left, Right};

    #[test]
    fn length_never_exceeds_capacity() {
        let channel = DecisionChannel::new(5);
        for i in 0..20 {
            channel.publish(if i % 2 == 0 { Left } else { Right });
            assert!(channel.len() <= channel.capacity());
        }
        assert_eq!(channel.len(), 5);
    }

    #[test]
    fn overflow_keeps_the_last_capacity_entries_in_order() {
        // Publish 7 values into a capacity-5 channel: exactly the last 5
        // remain, in original relative order.
        let channel = DecisionChannel::new(5);
        let values = [Left, Left, Right, Left, Right, Right, Left];
        for value in values {
            channel.publish(value);
        }
        assert_eq!(channel.len(), 5);
        let drained: Vec<_> = std::iter::from_fn(|| channel.try_take()).collect();
        assert_eq!(drained, values[2..]);
    }

    #[test]
    fn publish_into_full_channel_evicts_exactly_one() {
        let channel = DecisionChannel::new(3);
        for _ in 0..3 {
            channel.publish(Left);
        }
        channel.publish(Right);
        assert_eq!(channel.len(), 3);
        assert_eq!(channel.try_take(), Some(Left));
        assert_eq!(channel.try_take(), Some(Left));
        assert_eq!(channel.try_take(), Some(Right));
    }

    #[test]
    fn take_on_empty_returns_none_immediately() {
        let channel = DecisionChannel::new(5);
        assert_eq!(channel.try_take(), None);
        channel.publish(Left);
        assert_eq!(channel.try_take(), Some(Left));
        assert_eq!(channel.try_take(), None);
    }

    #[test]
    fn take_returns_oldest_retained_entry() {
        // The consumer drains in FIFO order, not newest-first.
        let channel = DecisionChannel::new(5);
        channel.publish(Right);
        channel.publish(Left);
        assert_eq!(channel.try_take(), Some(Right));
        assert_eq!(channel.try_take(), Some(Left));
    }

    #[test]
    fn minimum_capacity_is_one() {
        let channel = DecisionChannel::new(0);
        channel.publish(Left);
        channel.publish(Right);
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.try_take(), Some(Right));
    }

    #[test]
    fn concurrent_publish_and_take_stay_bounded() {
        let channel = DecisionChannel::new(5);
        let producer = {
            let channel = channel.clone();
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    channel.publish(if i % 2 == 0 { Left } else { Right });
                }
            })
        };
        let consumer = {
            let channel = channel.clone();
            std::thread::spawn(move || {
                let mut taken = 0usize;
                for _ in 0..1_000 {
                    if channel.try_take().is_some() {
                        taken += 1;
                    }
                }
                taken
            })
        };
        producer.join().expect("producer panicked");
        let taken = consumer.join().expect("consumer panicked");
        assert!(channel.len() <= channel.capacity());
        assert!(taken <= 1_000);
    }
}
