//! Lazy permission filtering over a cursor.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::core::{Cursor, acl_fields};
use crate::error::{ResourceError, StorageResult};
use crate::types::{Document, FilterOptions, LoadOptions, User};

use super::collection::DelegatedCollection;
use super::owner::{OwnerRef, load_owner};

/// Iterator yielding the documents of a cursor whose owner grants access.
///
/// Created by [`DelegatedCollection::filter_results_by_permission`]. Input
/// order is preserved, `offset` counts granted documents only, and a `limit`
/// of `0` is unbounded. Decisions are cached per owner for the lifetime of
/// this value; dropping it stops all further owner lookups.
///
/// Documents whose owner reference cannot be resolved (malformed or missing
/// reference, unregistered owner type) are skipped with a warning. A reference
/// to an owner document that does not exist is yielded as a `NotFound` error,
/// as is any other failure; iteration continues after an `Err` item.
pub struct PermissionFilter<'a> {
    collection: &'a DelegatedCollection,
    cursor: Cursor,
    user: Option<&'a User>,
    options: FilterOptions,
    cache: HashMap<OwnerRef, bool>,
    missing: HashMap<OwnerRef, String>,
    skipped: usize,
    yielded: usize,
    owner_checks: usize,
}

impl<'a> PermissionFilter<'a> {
    pub(crate) fn new(
        collection: &'a DelegatedCollection,
        cursor: Cursor,
        user: Option<&'a User>,
        options: FilterOptions,
    ) -> Self {
        Self {
            collection,
            cursor,
            user,
            options,
            cache: HashMap::new(),
            missing: HashMap::new(),
            skipped: 0,
            yielded: 0,
            owner_checks: 0,
        }
    }

    /// Returns how many owners have been fetched so far.
    pub fn owner_checks(&self) -> usize {
        self.owner_checks
    }

    /// Returns the filter options in use.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    fn exhausted(&self) -> bool {
        self.options.limit > 0 && self.yielded >= self.options.limit
    }

    fn is_granted(&mut self, doc: &Document) -> StorageResult<bool> {
        let owner = self.collection.resolve_owner_type(doc)?;
        if let Some(&granted) = self.cache.get(&owner) {
            debug!(owner = %owner, granted, "Owner decision cache hit");
            return Ok(granted);
        }
        if let Some(collection) = self.missing.get(&owner) {
            return Err(ResourceError::NotFound {
                collection: collection.clone(),
                id: owner.id,
            }
            .into());
        }

        debug!(owner = %owner, "Owner decision cache miss");
        match self.check_owner(&owner) {
            Ok(granted) => {
                self.cache.insert(owner, granted);
                Ok(granted)
            }
            Err(err) => {
                if err.is_unmatched_owner() {
                    self.cache.insert(owner, false);
                }
                Err(err)
            }
        }
    }

    fn check_owner(&mut self, owner: &OwnerRef) -> StorageResult<bool> {
        let model = self.collection.owner_model(&owner.resource_type)?;
        self.owner_checks += 1;

        let flags = &self.options.flags;
        let fields = match model.access_control() {
            Some(controlled) => controlled.access_fields(!flags.is_empty()),
            None => acl_fields(!flags.is_empty()),
        };
        let owner_doc = match load_owner(
            model.as_ref(),
            &owner.id,
            &LoadOptions::forced().with_fields(fields),
        ) {
            Ok(doc) => doc,
            Err(err) => {
                if err.is_not_found() {
                    self.missing.insert(owner.clone(), model.name().to_string());
                }
                return Err(err);
            }
        };

        match model.access_control() {
            Some(controlled) => {
                if !controlled.has_access(&owner_doc, self.user, self.options.level)? {
                    return Ok(false);
                }
                if flags.is_empty() {
                    return Ok(true);
                }
                controlled.has_access_flags(&owner_doc, self.user, flags)
            }
            None => Ok(flags.is_empty()),
        }
    }
}

impl Iterator for PermissionFilter<'_> {
    type Item = StorageResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.exhausted() {
                return None;
            }

            let mut doc = match self.cursor.next()? {
                Ok(doc) => doc,
                Err(err) => return Some(Err(err)),
            };

            match self.is_granted(&doc) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) if err.is_unmatched_owner() => {
                    warn!(
                        collection = %self.collection.config().collection,
                        id = ?doc.id(),
                        error = %err,
                        "Excluding document with unmatched owner"
                    );
                    continue;
                }
                Err(err) => return Some(Err(err)),
            }

            if self.skipped < self.options.offset {
                self.skipped += 1;
                continue;
            }

            for key in &self.options.remove_keys {
                doc.remove(key);
            }
            self.yielded += 1;
            return Some(Ok(doc));
        }
    }
}

impl fmt::Debug for PermissionFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionFilter")
            .field("collection", &self.collection.config().collection)
            .field("options", &self.options)
            .field("skipped", &self.skipped)
            .field("yielded", &self.yielded)
            .field("owner_checks", &self.owner_checks)
            .finish()
    }
}
