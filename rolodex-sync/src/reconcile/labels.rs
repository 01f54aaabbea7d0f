//! Label groups and membership reconciliation

use crate::operation::{FieldValue, Operation, ParentRef};
use crate::ports::LabelGroupStore;
use rolodex_common::model::GroupId;
use rolodex_common::{FieldType, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Maps label titles to durable group ids, creating groups on first use
///
/// Titles match exactly (case-sensitive). Resolved ids are remembered for
/// the resolver's lifetime; uniqueness across resolvers is the store's job.
pub struct LabelGroupResolver<'a> {
    store: &'a dyn LabelGroupStore,
    resolved: HashMap<String, GroupId>,
}

impl<'a> LabelGroupResolver<'a> {
    pub fn new(store: &'a dyn LabelGroupStore) -> Self {
        Self {
            store,
            resolved: HashMap::new(),
        }
    }

    pub async fn resolve(&mut self, title: &str) -> Result<GroupId> {
        if let Some(id) = self.resolved.get(title) {
            return Ok(*id);
        }

        let id = match self.store.find_by_title(title).await? {
            Some(id) => id,
            None => {
                let id = self.store.create(title).await?;
                info!("Created label group '{}' ({})", title, id);
                id
            }
        };

        self.resolved.insert(title.to_string(), id);
        Ok(id)
    }
}

/// Distinct titles, first occurrence wins
fn distinct(titles: &[String]) -> Vec<&str> {
    let mut seen = Vec::with_capacity(titles.len());
    for title in titles {
        if !seen.contains(&title.as_str()) {
            seen.push(title.as_str());
        }
    }
    seen
}

fn membership_insert(group: GroupId, parent: ParentRef) -> Operation {
    Operation::Insert {
        field: FieldType::Label,
        value: FieldValue::Membership(group),
        parent,
    }
}

/// One membership insert per distinct title
pub async fn insert_memberships(
    resolver: &mut LabelGroupResolver<'_>,
    parent: ParentRef,
    titles: &[String],
) -> Result<Vec<Operation>> {
    let mut operations = Vec::new();
    for title in distinct(titles) {
        let group = resolver.resolve(title).await?;
        operations.push(membership_insert(group, parent));
    }
    Ok(operations)
}

/// Symmetric difference of label sets
///
/// Deletes cover `existing \ desired` (only where a membership row is
/// known for the group), inserts cover `desired \ existing`.
pub async fn reconcile_labels(
    resolver: &mut LabelGroupResolver<'_>,
    parent: ParentRef,
    existing: &[String],
    memberships: &BTreeMap<GroupId, String>,
    desired: &[String],
) -> Result<Vec<Operation>> {
    let existing = distinct(existing);
    let desired = distinct(desired);
    let mut operations = Vec::new();

    for title in existing.iter().filter(|t| !desired.contains(t)) {
        let group = resolver.resolve(title).await?;
        match memberships.get(&group) {
            Some(row_id) => operations.push(Operation::Delete {
                field: FieldType::Label,
                row_id: row_id.clone(),
            }),
            None => debug!("label '{}': no membership row to remove", title),
        }
    }

    for title in desired.iter().filter(|t| !existing.contains(t)) {
        let group = resolver.resolve(title).await?;
        operations.push(membership_insert(group, parent));
    }

    Ok(operations)
}
