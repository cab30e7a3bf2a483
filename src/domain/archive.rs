//! Key-driven archiving.
//!
//! An [`Archive`] stores a subtree as a flat list of records in pre-order.
//! Each record lists the kind's mutable keys in order; the children key holds
//! positions of child records. Reading tolerates missing keys (they take the
//! key-table default) and unknown keys (skipped), so archives survive kinds
//! gaining or losing fields.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{NodeError, NodeResult};
use crate::domain::keyed::KeyedRecord;
use crate::domain::keys::NodeKind;
use crate::domain::value::AttributeValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    /// Kind that wrote the archive
    pub kind: String,
    /// Pre-order records, the archived root first
    pub records: Vec<ArchiveRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub fields: Vec<ArchiveField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveField {
    pub key: String,
    pub value: ArchiveValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArchiveValue {
    Value(AttributeValue),
    /// Positions of child records
    Children(Vec<usize>),
}

impl Archive {
    pub fn to_json(&self) -> NodeResult<String> {
        serde_json::to_string(self).map_err(|e| NodeError::encoding(e.to_string()))
    }

    pub fn from_json(json: &str) -> NodeResult<Self> {
        serde_json::from_str(json).map_err(|e| NodeError::encoding(e.to_string()))
    }

    fn into_keyed_records(self) -> NodeResult<Vec<KeyedRecord>> {
        self.records
            .into_iter()
            .enumerate()
            .map(|(pos, record)| {
                let mut values = Vec::new();
                let mut children: Option<Vec<usize>> = None;
                for field in record.fields {
                    match field.value {
                        ArchiveValue::Value(v) => values.push((field.key, v)),
                        ArchiveValue::Children(c) => {
                            if children.replace(c).is_some() {
                                return Err(NodeError::encoding(format!(
                                    "record {} has more than one children field",
                                    pos
                                )));
                            }
                        }
                    }
                }
                Ok(KeyedRecord {
                    values,
                    children: children.unwrap_or_default(),
                })
            })
            .collect()
    }
}

impl<K: NodeKind> NodeArena<K> {
    /// Archive the subtree at `id`.
    #[instrument(level = "debug", skip(self))]
    pub fn archive(&self, id: NodeId) -> NodeResult<Archive> {
        let keys = K::mutable_keys();
        let records = self
            .keyed_records(id)?
            .into_iter()
            .map(|record| {
                let mut values = record.values.into_iter();
                let fields = keys
                    .iter()
                    .map(|key| {
                        let value = if key.is_children() {
                            ArchiveValue::Children(record.children.clone())
                        } else {
                            // keyed records follow the same key order
                            let (_, v) = values
                                .next()
                                .ok_or_else(|| NodeError::encoding("record shorter than key list"))?;
                            ArchiveValue::Value(v)
                        };
                        Ok(ArchiveField {
                            key: key.name().to_string(),
                            value,
                        })
                    })
                    .collect::<NodeResult<Vec<_>>>()?;
                Ok(ArchiveRecord { fields })
            })
            .collect::<NodeResult<Vec<_>>>()?;

        debug!("archived {} records of kind {}", records.len(), K::KIND_NAME);
        Ok(Archive {
            kind: K::KIND_NAME.to_string(),
            records,
        })
    }

    /// Rebuild an archived subtree as a new root in this arena.
    ///
    /// Fails with [`NodeError::EncodingError`] on malformed child references,
    /// values of the wrong type, or leaf records holding children.
    #[instrument(level = "debug", skip(self, archive))]
    pub fn unarchive(&mut self, archive: &Archive) -> NodeResult<NodeId> {
        if archive.kind != K::KIND_NAME {
            debug!(
                "reading archive of kind {} as {}",
                archive.kind,
                K::KIND_NAME
            );
        }
        let records = archive.clone().into_keyed_records()?;
        self.build_from_records(&records).map_err(|e| match e {
            NodeError::LeafCannotHaveChildren(_)
            | NodeError::AttributeType { .. }
            | NodeError::UnknownAttribute(_) => NodeError::encoding(e.to_string()),
            other => other,
        })
    }
}
