use crate::core::traits::MessageSink;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, warn};

/// In-memory sink collecting warnings and errors for a frontend to drain
#[derive(Debug, Default)]
pub struct MessagesAggregator {
    warnings: Mutex<VecDeque<String>>,
    errors: Mutex<VecDeque<String>>,
}

/// Queues stay valid after a writer panics
fn lock_queue(queue: &Mutex<VecDeque<String>>) -> MutexGuard<'_, VecDeque<String>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MessagesAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all pending warnings
    pub fn consume_warnings(&self) -> Vec<String> {
        lock_queue(&self.warnings).drain(..).collect()
    }

    /// Drain all pending errors
    pub fn consume_errors(&self) -> Vec<String> {
        lock_queue(&self.errors).drain(..).collect()
    }
}

impl MessageSink for MessagesAggregator {
    fn add_warning(&self, message: String) {
        warn!("{}", message);
        lock_queue(&self.warnings).push_back(message);
    }

    fn add_error(&self, message: String) {
        error!("{}", message);
        lock_queue(&self.errors).push_back(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_consume_drains_in_order() {
        let aggregator = MessagesAggregator::new();
        aggregator.add_warning("first".to_string());
        aggregator.add_warning("second".to_string());
        aggregator.add_error("broken".to_string());

        assert_eq!(aggregator.consume_warnings(), vec!["first", "second"]);
        assert!(aggregator.consume_warnings().is_empty());
        assert_eq!(aggregator.consume_errors(), vec!["broken"]);
    }

    #[test]
    fn test_poisoned_queue_keeps_messages() {
        let aggregator = Arc::new(MessagesAggregator::new());
        aggregator.add_warning("before".to_string());

        let poisoner = aggregator.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.warnings.lock().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(aggregator.warnings.is_poisoned());

        aggregator.add_warning("after".to_string());
        assert_eq!(aggregator.consume_warnings(), vec!["before", "after"]);
    }
}
