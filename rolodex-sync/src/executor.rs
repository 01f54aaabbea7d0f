//! Atomic batch application

use crate::error::{BatchError, BatchErrorKind};
use crate::operation::{Operation, ParentRef};
use crate::ports::TransactionalBatchStore;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Applies a planned batch as one all-or-nothing transaction
pub struct BatchExecutor<'a> {
    store: &'a dyn TransactionalBatchStore,
    commit_timeout: Duration,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(store: &'a dyn TransactionalBatchStore, commit_timeout: Duration) -> Self {
        Self {
            store,
            commit_timeout,
        }
    }

    /// Commit every operation or none of them
    ///
    /// An empty batch succeeds without touching the store. Operations that
    /// do not finish within the timeout are abandoned and rolled back.
    pub async fn apply(&self, operations: &[Operation]) -> Result<(), BatchError> {
        if operations.is_empty() {
            debug!("Empty batch, nothing to apply");
            return Ok(());
        }

        validate_back_references(operations)?;

        match self.store.commit_within(operations, self.commit_timeout).await {
            Ok(()) => {
                info!("Applied batch of {} operations", operations.len());
                Ok(())
            }
            Err(e) if e.kind == BatchErrorKind::Timeout => {
                warn!(
                    "Batch of {} operations timed out after {:?}",
                    operations.len(),
                    self.commit_timeout
                );
                Err(e)
            }
            Err(e) => {
                warn!("Batch of {} operations rolled back: {}", operations.len(), e);
                Err(e)
            }
        }
    }
}

/// Back-references must point at a parent insert earlier in the batch
fn validate_back_references(operations: &[Operation]) -> Result<(), BatchError> {
    for (position, op) in operations.iter().enumerate() {
        if let Operation::Insert {
            field,
            parent: ParentRef::BackReference(target),
            ..
        } = op
        {
            let valid = *target < position
                && matches!(operations.get(*target), Some(Operation::CreateParent(_)));
            if !valid {
                return Err(BatchError::rejected(
                    position + 1,
                    Some(*field),
                    format!("back-reference to position {} is not an earlier parent insert", target),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{FieldValue, ParentRecord};
    use async_trait::async_trait;
    use rolodex_common::model::ParentId;
    use rolodex_common::FieldType;
    use std::sync::Mutex;

    /// Records committed batches; optionally fails or stalls
    #[derive(Default)]
    struct Recorder {
        committed: Mutex<Vec<Vec<Operation>>>,
        fail_at: Option<usize>,
        stall: Option<Duration>,
    }

    #[async_trait]
    impl TransactionalBatchStore for Recorder {
        async fn commit(&self, operations: &[Operation]) -> Result<(), BatchError> {
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            if let Some(index) = self.fail_at {
                return Err(BatchError::rejected(index, operations[index - 1].field(), "refused"));
            }
            self.committed.lock().unwrap().push(operations.to_vec());
            Ok(())
        }
    }

    fn note(parent: ParentRef) -> Operation {
        Operation::Insert {
            field: FieldType::Note,
            value: FieldValue::Text(Some("hi".into())),
            parent,
        }
    }

    fn create_parent() -> Operation {
        Operation::CreateParent(ParentRecord {
            identifier: "k1".into(),
            account_type: None,
            account_name: None,
        })
    }

    #[tokio::test]
    async fn test_empty_batch_skips_store() {
        let store = Recorder::default();
        BatchExecutor::new(&store, Duration::from_secs(1))
            .apply(&[])
            .await
            .unwrap();
        assert!(store.committed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_committed_once() {
        let store = Recorder::default();
        let ops = vec![create_parent(), note(ParentRef::BackReference(0))];
        BatchExecutor::new(&store, Duration::from_secs(1))
            .apply(&ops)
            .await
            .unwrap();
        assert_eq!(*store.committed.lock().unwrap(), vec![ops]);
    }

    #[tokio::test]
    async fn test_failure_is_passed_through() {
        let store = Recorder {
            fail_at: Some(2),
            ..Recorder::default()
        };
        let parent = ParentRef::Id(ParentId(1));
        let err = BatchExecutor::new(&store, Duration::from_secs(1))
            .apply(&[note(parent), note(parent)])
            .await
            .unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.kind, BatchErrorKind::Rejected);
        assert_eq!(err.field, Some(FieldType::Note));
    }

    #[tokio::test]
    async fn test_dangling_back_reference_rejected_before_commit() {
        let store = Recorder::default();
        let ops = vec![note(ParentRef::BackReference(1)), create_parent()];
        let err = BatchExecutor::new(&store, Duration::from_secs(1))
            .apply(&ops)
            .await
            .unwrap_err();
        assert_eq!(err.index, 1);
        assert!(store.committed.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_commit_times_out() {
        let store = Recorder {
            stall: Some(Duration::from_secs(60)),
            ..Recorder::default()
        };
        let err = BatchExecutor::new(&store, Duration::from_millis(50))
            .apply(&[note(ParentRef::Id(ParentId(1)))])
            .await
            .unwrap_err();
        assert_eq!(err.kind, BatchErrorKind::Timeout);
        assert_eq!(err.index, 0);
        assert!(err.is_transient());
    }
}
