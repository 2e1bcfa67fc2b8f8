//! Plain in-memory collection.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::{Cursor, Model};
use crate::error::{ResourceError, StorageResult};
use crate::types::{Document, ResourceType, SortDirective};

use super::query::{
    any_field_matches, matches_filters, prefix_pattern, sort_documents, text_pattern,
};

const DEFAULT_TEXT_FIELDS: [&str; 2] = ["name", "description"];
const DEFAULT_PREFIX_FIELD: &str = "lowerName";

#[derive(Default)]
struct State {
    order: Vec<String>,
    docs: HashMap<String, Document>,
}

/// An insertion-ordered collection held in memory.
///
/// Has no ACL of its own. Every id lookup is counted, so tests can assert how
/// many times a collection was consulted.
pub struct MemoryCollection {
    resource_type: ResourceType,
    text_fields: Vec<String>,
    prefix_field: String,
    state: RwLock<State>,
    lookups: AtomicUsize,
}

impl Debug for MemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("resource_type", &self.resource_type)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl MemoryCollection {
    /// Creates an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_type(ResourceType::new(name))
    }

    /// Creates an empty collection provided by a plugin namespace.
    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::with_type(ResourceType::namespaced(name, namespace))
    }

    /// Creates an empty collection registered under `resource_type`.
    pub fn with_type(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            text_fields: DEFAULT_TEXT_FIELDS.iter().map(|s| s.to_string()).collect(),
            prefix_field: DEFAULT_PREFIX_FIELD.to_string(),
            state: RwLock::new(State::default()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Sets the fields searched by full-text search.
    pub fn with_text_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the field searched by prefix search.
    pub fn with_prefix_field(mut self, field: impl Into<String>) -> Self {
        self.prefix_field = field.into();
        self
    }

    /// Inserts or replaces a document.
    ///
    /// A document without `_id` is given a fresh UUID. A `name` without a
    /// `lowerName` also gets a lower-cased copy for prefix search.
    pub fn save(&self, value: Value) -> StorageResult<Document> {
        let mut doc = Document::from_value(value)?;
        let id = match doc.id() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                doc.set_id(id.clone());
                id
            }
        };
        let lower_name = doc
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_lowercase);
        if let Some(lower) = lower_name
            && !doc.contains_key(DEFAULT_PREFIX_FIELD)
        {
            doc.insert(DEFAULT_PREFIX_FIELD, Value::String(lower));
        }

        let mut state = self.state.write();
        if state.docs.insert(id.clone(), doc.clone()).is_none() {
            state.order.push(id);
        }
        Ok(doc)
    }

    /// Applies `update` to a stored document and returns the new version.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - If there is no such document
    pub fn update<F>(&self, id: &str, update: F) -> StorageResult<Document>
    where
        F: FnOnce(&mut Document) -> StorageResult<()>,
    {
        let mut state = self.state.write();
        let doc = state.docs.get_mut(id).ok_or_else(|| ResourceError::NotFound {
            collection: self.resource_type.name().to_string(),
            id: id.to_string(),
        })?;
        update(doc)?;
        Ok(doc.clone())
    }

    /// Removes a document. Returns `true` if it existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.state.write();
        if state.docs.remove(id).is_some() {
            state.order.retain(|existing| existing != id);
            true
        } else {
            false
        }
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> usize {
        self.state.read().docs.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many id lookups have been served.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Resets the lookup counter.
    pub fn reset_lookup_count(&self) {
        self.lookups.store(0, Ordering::Relaxed);
    }

    fn snapshot<P>(
        &self,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
        predicate: P,
    ) -> Cursor
    where
        P: Fn(&Document) -> bool,
    {
        let mut docs: Vec<Document> = {
            let state = self.state.read();
            state
                .order
                .iter()
                .filter_map(|id| state.docs.get(id))
                .filter(|&doc| matches_filters(doc, filters) && predicate(doc))
                .cloned()
                .collect()
        };
        sort_documents(&mut docs, sort);
        let docs: Vec<_> = docs
            .into_iter()
            .map(|doc| match fields {
                Some(fields) => Ok(doc.project(fields)),
                None => Ok(doc),
            })
            .collect();
        Box::new(docs.into_iter())
    }

    fn search_with(
        &self,
        pattern: Option<Regex>,
        fields_to_match: &[String],
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> Cursor {
        match pattern {
            Some(pattern) => self.snapshot(filters, sort, fields, |doc| {
                any_field_matches(doc, fields_to_match, &pattern)
            }),
            None => Box::new(std::iter::empty()),
        }
    }
}

impl Model for MemoryCollection {
    fn name(&self) -> &str {
        self.resource_type.name()
    }

    fn resource_type(&self) -> ResourceType {
        self.resource_type.clone()
    }

    fn find_by_id(&self, id: &str, fields: Option<&[String]>) -> StorageResult<Option<Document>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();
        Ok(state.docs.get(id).map(|doc| match fields {
            Some(fields) => doc.project(fields),
            None => doc.clone(),
        }))
    }

    fn find(
        &self,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        Ok(self.snapshot(filters, sort, fields, |_| true))
    }

    fn search_text(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        let pattern = text_pattern(query)?;
        Ok(self.search_with(pattern, &self.text_fields, filters, sort, fields))
    }

    fn search_prefix(
        &self,
        query: &str,
        filters: &Map<String, Value>,
        sort: &[SortDirective],
        fields: Option<&[String]>,
    ) -> StorageResult<Cursor> {
        let pattern = prefix_pattern(query)?;
        let prefix_fields = std::slice::from_ref(&self.prefix_field);
        Ok(self.search_with(Some(pattern), prefix_fields, filters, sort, fields))
    }
}
