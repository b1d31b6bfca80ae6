//! In-memory provenance store.
//!
//! An id-keyed arena: nodes in a map keyed by their stable ids,
//! associations and attributes as explicit rows. Doubles as the test
//! fixture and as the store for embedded use.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{
    AssocType, Association, ContentNode, NodeKind, ProvenanceStore, StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<String, ContentNode>,
    assocs: Vec<Association>,
    attrs: Vec<(String, String, String)>,
    sequences: HashMap<&'static str, u64>,
}

/// Provenance store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryProvenanceStore {
    inner: Mutex<Inner>,
}

impl MemoryProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProvenanceStore for MemoryProvenanceStore {
    fn next_id(&self, kind: NodeKind) -> StoreResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let seq = inner.sequences.entry(kind.as_str()).or_insert(10_000);
        *seq += 1;
        Ok(format!("{}-{}", kind.as_str(), *seq))
    }

    fn create_node(&self, node: ContentNode) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.nodes.contains_key(&node.id) {
            return Err(StoreError(format!("duplicate node id '{}'", node.id)));
        }
        inner.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    fn link(&self, from_id: &str, to_id: &str, assoc_type: AssocType) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(from_id) || !inner.nodes.contains_key(to_id) {
            return Err(StoreError(format!(
                "cannot link '{}' -> '{}': missing node",
                from_id, to_id
            )));
        }
        inner.assocs.push(Association {
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
            assoc_type,
        });
        Ok(())
    }

    fn set_attribute(&self, node_id: &str, name: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(node_id) {
            return Err(StoreError(format!("no node '{}' for attribute", node_id)));
        }
        if let Some(row) = inner
            .attrs
            .iter_mut()
            .find(|(id, n, _)| id == node_id && n == name)
        {
            row.2 = value.to_string();
        } else {
            inner
                .attrs
                .push((node_id.to_string(), name.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn get_node(&self, id: &str) -> StoreResult<Option<ContentNode>> {
        Ok(self.inner.lock().unwrap().nodes.get(id).cloned())
    }

    fn query_by_kind(&self, kind: NodeKind) -> StoreResult<Vec<ContentNode>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .nodes
            .values()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect())
    }

    fn linked_to(&self, from_id: &str, assoc_type: AssocType) -> StoreResult<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .assocs
            .iter()
            .filter(|a| a.from_id == from_id && a.assoc_type == assoc_type)
            .map(|a| a.to_id.clone())
            .collect())
    }

    fn attributes(&self, node_id: &str) -> StoreResult<Vec<(String, String)>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attrs
            .iter()
            .filter(|(id, _, _)| id == node_id)
            .map(|(_, n, v)| (n.clone(), v.clone()))
            .collect())
    }

    fn update_body(&self, node_id: &str, body: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.nodes.get_mut(node_id) {
            Some(node) => {
                node.body = Some(body.to_string());
                Ok(())
            }
            None => Err(StoreError(format!("no node '{}' to update", node_id))),
        }
    }

    fn delete_attributes(&self, node_id: &str) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .attrs
            .retain(|(id, _, _)| id != node_id);
        Ok(())
    }

    fn delete_node(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes.remove(id);
        inner.assocs.retain(|a| a.from_id != id && a.to_id != id);
        Ok(())
    }
}
