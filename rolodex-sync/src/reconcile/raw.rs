//! Parent record bootstrap

use crate::operation::{Operation, ParentRecord, ParentRef};
use rolodex_common::Aggregate;
use uuid::Uuid;

/// Builds the insert that creates a new parent record
pub struct RawRecordCreator;

impl RawRecordCreator {
    /// Parent insert plus the back-reference its children must use
    ///
    /// `position` is where the insert will sit in the batch. The new
    /// contact gets a fresh random key; any key on `desired` is ignored.
    pub fn create_parent(desired: &Aggregate, position: usize) -> (Operation, ParentRef) {
        let record = ParentRecord {
            identifier: Uuid::new_v4().to_string(),
            account_type: desired.account_type.clone(),
            account_name: desired.account_name.clone(),
        };
        (Operation::CreateParent(record), ParentRef::BackReference(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_gets_fresh_key_and_back_reference() {
        let mut desired = Aggregate::default();
        desired.identifier = Some("ignored".into());
        desired.account_type = Some("local".into());

        let (op, parent) = RawRecordCreator::create_parent(&desired, 0);

        assert_eq!(parent, ParentRef::BackReference(0));
        match op {
            Operation::CreateParent(record) => {
                assert_ne!(record.identifier, "ignored");
                assert!(Uuid::parse_str(&record.identifier).is_ok());
                assert_eq!(record.account_type.as_deref(), Some("local"));
                assert_eq!(record.account_name, None);
            }
            other => panic!("expected parent insert, got {:?}", other),
        }
    }
}
