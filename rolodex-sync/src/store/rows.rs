//! Mapping between field values and `contact_data` rows

use crate::operation::FieldValue;
use rolodex_common::model::{
    classify_label, label_for_kind, GroupId, LabelKind, Organization, StructuredName,
};
use rolodex_common::{Aggregate, FieldType, LabeledItem, PostalAddress, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;

/// Column values written for one field item
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Columns {
    pub kind: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
    pub payload: Option<String>,
}

impl Columns {
    fn labeled(field: FieldType, label: Option<&str>) -> Self {
        let (kind, custom) = classify_label(field, label);
        Self {
            kind: Some(kind.as_str().to_string()),
            label: custom,
            ..Self::default()
        }
    }
}

/// Columns for `value` stored under `field`
///
/// Errors (as a message) when the value shape does not belong to the field.
pub(crate) fn columns_for(field: FieldType, value: &FieldValue) -> std::result::Result<Columns, String> {
    let columns = match (field, value) {
        (
            FieldType::Phone
            | FieldType::Email
            | FieldType::Website
            | FieldType::Im
            | FieldType::Relation
            | FieldType::Event,
            FieldValue::Labeled(item),
        ) => Columns {
            value: item.value.clone(),
            ..Columns::labeled(field, item.label.as_deref())
        },
        (FieldType::PostalAddress, FieldValue::Postal(address)) => {
            let content = PostalAddress {
                identifier: None,
                label: None,
                ..address.clone()
            };
            let line = address
                .formatted_address
                .clone()
                .unwrap_or_else(|| address.to_string());
            Columns {
                value: Some(line).filter(|l| !l.is_empty()),
                payload: Some(encode(&content)?),
                ..Columns::labeled(field, address.label.as_deref())
            }
        }
        (FieldType::Name, FieldValue::Name(name)) => Columns {
            payload: Some(encode(name)?),
            ..Columns::default()
        },
        (FieldType::Organization, FieldValue::Organization(organization)) => Columns {
            value: organization.company.clone(),
            payload: Some(encode(organization)?),
            ..Columns::default()
        },
        (
            FieldType::Nickname | FieldType::Sip | FieldType::Note | FieldType::Birthday,
            FieldValue::Text(text),
        ) => Columns {
            value: text.clone(),
            ..Columns::default()
        },
        (FieldType::Label, FieldValue::Membership(group)) => Columns {
            value: Some(group.0.to_string()),
            ..Columns::default()
        },
        (field, value) => {
            return Err(format!("{} cannot hold a {} value", field, value_kind(value)));
        }
    };

    Ok(columns)
}

fn value_kind(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Labeled(_) => "labeled",
        FieldValue::Postal(_) => "postal",
        FieldValue::Name(_) => "name",
        FieldValue::Organization(_) => "organization",
        FieldValue::Text(_) => "text",
        FieldValue::Membership(_) => "membership",
    }
}

fn encode<T: serde::Serialize>(value: &T) -> std::result::Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

/// Fold one `contact_data` row (joined with its group title) into `contact`
pub(crate) fn apply_row(contact: &mut Aggregate, row: &SqliteRow) -> Result<()> {
    let row_id = row.get::<i64, _>("id").to_string();
    let field_name: String = row.get("field");
    let kind: Option<String> = row.get("kind");
    let custom: Option<String> = row.get("label");
    let value: Option<String> = row.get("value");
    let payload: Option<String> = row.get("payload");

    let Some(field) = FieldType::from_db(&field_name) else {
        warn!("Skipping row {} with unknown field '{}'", row_id, field_name);
        return Ok(());
    };

    let label = || {
        let kind = kind.clone().unwrap_or_else(|| LabelKind::Custom.as_str().to_string());
        Some(label_for_kind(&kind, custom.clone())).filter(|l| !l.is_empty())
    };
    let labeled = |value: Option<String>| LabeledItem {
        identifier: Some(row_id.clone()),
        label: label(),
        value,
    };

    match field {
        FieldType::Phone => contact.phones.push(labeled(value)),
        FieldType::Email => contact.emails.push(labeled(value)),
        FieldType::Website => contact.websites.push(labeled(value)),
        FieldType::Im => contact.instant_message_addresses.push(labeled(value)),
        FieldType::Relation => contact.relations.push(labeled(value)),
        FieldType::Event => contact.dates.push(labeled(value)),
        FieldType::PostalAddress => {
            let mut address: PostalAddress = decode(payload.as_deref())?;
            address.identifier = Some(row_id.clone());
            address.label = label();
            contact.postal_addresses.push(address);
        }
        FieldType::Name => {
            contact.name = decode::<StructuredName>(payload.as_deref())?;
            contact.rows.name = Some(row_id);
        }
        FieldType::Organization => {
            contact.organization = decode::<Organization>(payload.as_deref())?;
            contact.rows.organization = Some(row_id);
        }
        FieldType::Nickname => {
            contact.nickname = value;
            contact.rows.nickname = Some(row_id);
        }
        FieldType::Sip => {
            contact.sip = value;
            contact.rows.sip = Some(row_id);
        }
        FieldType::Note => {
            contact.note = value;
            contact.rows.note = Some(row_id);
        }
        FieldType::Birthday => {
            contact.birthday = value;
            contact.rows.birthday = Some(row_id);
        }
        FieldType::Label => {
            let group = value.as_deref().and_then(|v| v.parse::<i64>().ok());
            let title: Option<String> = row.get("group_title");
            match (group, title) {
                (Some(group), Some(title)) => {
                    contact.labels.push(title);
                    contact.rows.memberships.insert(GroupId(group), row_id);
                }
                _ => warn!("Membership row {} points at no label group", row_id),
            }
        }
    }

    Ok(())
}

/// Decode a JSON payload; an absent payload yields the empty value
fn decode<T: serde::de::DeserializeOwned + Default>(payload: Option<&str>) -> Result<T> {
    match payload {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(T::default()),
    }
}
