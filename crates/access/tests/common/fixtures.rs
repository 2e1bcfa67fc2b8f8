//! Collections and documents for access layer testing.
//!
//! The world looks like this:
//!
//! ```text
//! folder (ACL) ◀── item (declared: folderId)
//!      ▲                ▲
//!      └──── file (attached: attachedToType/attachedToId) ──▶ assetstore (plain)
//!
//! annotation@large_image (ACL) ◀── element (declared: annotationId)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use helios_access::backends::memory::{AclCollection, MemoryCollection};
use helios_access::core::{Cursor, ModelRegistry};
use helios_access::delegation::{DelegatedCollection, DelegationConfig};
use helios_access::types::{Document, ResourceType};

/// Every collection of the test world.
pub struct World {
    pub registry: Arc<ModelRegistry>,
    pub folders: Arc<AclCollection>,
    pub assetstores: Arc<MemoryCollection>,
    pub annotations: Arc<AclCollection>,
    pub item_store: Arc<MemoryCollection>,
    pub items: Arc<DelegatedCollection>,
    pub file_store: Arc<MemoryCollection>,
    pub files: Arc<DelegatedCollection>,
    pub element_store: Arc<MemoryCollection>,
    pub elements: Arc<DelegatedCollection>,
}

impl World {
    /// Creates and registers every collection, all empty.
    pub fn new() -> Self {
        let registry = Arc::new(ModelRegistry::new());

        let folders = Arc::new(AclCollection::new("folder"));
        let assetstores = Arc::new(MemoryCollection::new("assetstore"));
        let annotations = Arc::new(AclCollection::namespaced("annotation", "large_image"));
        registry.register(folders.clone()).expect("register folder");
        registry.register(assetstores.clone()).expect("register assetstore");
        registry.register(annotations.clone()).expect("register annotation");

        let item_store = Arc::new(MemoryCollection::new("item"));
        let items = delegate(
            &registry,
            DelegationConfig::declared("item", ResourceType::new("folder"), "folderId"),
            item_store.clone(),
        );

        let file_store = Arc::new(MemoryCollection::new("file"));
        let files = delegate(&registry, DelegationConfig::attached("file"), file_store.clone());

        let element_store = Arc::new(MemoryCollection::new("element"));
        let elements = delegate(
            &registry,
            DelegationConfig::declared(
                "element",
                ResourceType::namespaced("annotation", "large_image"),
                "annotationId",
            ),
            element_store.clone(),
        );

        Self {
            registry,
            folders,
            assetstores,
            annotations,
            item_store,
            items,
            file_store,
            files,
            element_store,
            elements,
        }
    }

    /// Creates a private folder and returns its id.
    pub fn folder(&self, name: &str) -> String {
        self.folders
            .save(json!({"name": name, "public": false}))
            .expect("save folder")
            .id()
            .expect("folder id")
    }

    /// Creates an item in a folder.
    pub fn item(&self, folder_id: &str, name: &str) -> Document {
        self.item_store
            .save(json!({"name": name, "folderId": folder_id}))
            .expect("save item")
    }

    /// Creates a file attached to an owner.
    pub fn file(&self, owner_type: Value, owner_id: &str, name: &str) -> Document {
        self.file_store
            .save(json!({
                "name": name,
                "attachedToType": owner_type,
                "attachedToId": owner_id
            }))
            .expect("save file")
    }

    /// Resets every lookup counter.
    pub fn reset_counters(&self) {
        self.folders.reset_lookup_count();
        self.assetstores.reset_lookup_count();
        self.annotations.reset_lookup_count();
        self.item_store.reset_lookup_count();
        self.file_store.reset_lookup_count();
        self.element_store.reset_lookup_count();
    }
}

fn delegate(
    registry: &Arc<ModelRegistry>,
    config: DelegationConfig,
    store: Arc<MemoryCollection>,
) -> Arc<DelegatedCollection> {
    let collection =
        Arc::new(DelegatedCollection::new(config, store, registry).expect("delegated collection"));
    registry
        .register(collection.clone())
        .expect("register delegated collection");
    collection
}

/// A cursor over fixed documents that counts how many were pulled.
pub fn counting_cursor(docs: Vec<Document>) -> (Cursor, Arc<AtomicUsize>) {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = pulled.clone();
    let cursor = docs.into_iter().map(move |doc| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(doc)
    });
    (Box::new(cursor), pulled)
}

/// A cursor over fixed documents.
pub fn cursor_of(docs: Vec<Document>) -> Cursor {
    Box::new(docs.into_iter().map(Ok))
}

/// Parses a document literal.
pub fn doc(value: Value) -> Document {
    Document::from_value(value).expect("document literal")
}
