//! Memoized, single-flight typekit loading.
//!
//! One importer is shared by everything that loads into a main project, so
//! a typekit reachable through several imports is parsed and merged once.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{DescriptorParser, PackageResolver, TypekitSource},
    },
    domain::{Typekit, Typelist},
    error::ForgeResult,
};

/// Load state of one typekit name.
#[derive(Debug, Clone)]
pub enum Resolution {
    Unresolved,
    /// Another caller is loading it.
    Resolving,
    /// `None` records that no such typekit exists.
    Resolved(Option<Arc<Typekit>>),
}

#[derive(Debug)]
enum Entry {
    Resolving,
    Resolved(Option<Arc<Typekit>>),
}

pub struct TypekitImporter {
    source: Box<dyn TypekitSource>,
    parser: Box<dyn DescriptorParser>,
    packages: Box<dyn PackageResolver>,
    entries: Mutex<HashMap<String, Entry>>,
    settled: Condvar,
}

impl TypekitImporter {
    pub fn new(
        source: Box<dyn TypekitSource>,
        parser: Box<dyn DescriptorParser>,
        packages: Box<dyn PackageResolver>,
    ) -> Self {
        Self {
            source,
            parser,
            packages,
            entries: Mutex::new(HashMap::new()),
            settled: Condvar::new(),
        }
    }

    /// Load `name`, or return the cached result.
    ///
    /// Concurrent calls for the same name wait for the first one. A failed
    /// load is not cached: the name goes back to unresolved and the next
    /// call tries again.
    #[instrument(skip(self))]
    pub fn import(&self, name: &str) -> ForgeResult<Option<Arc<Typekit>>> {
        let mut entries = self.entries.lock();
        loop {
            match entries.get(name) {
                Some(Entry::Resolved(typekit)) => return Ok(typekit.clone()),
                Some(Entry::Resolving) => self.settled.wait(&mut entries),
                None => break,
            }
        }
        entries.insert(name.to_string(), Entry::Resolving);
        drop(entries);

        let mut claim = Claim {
            importer: self,
            name,
            outcome: None,
        };
        let result = self.load(name);
        if let Ok(typekit) = &result {
            claim.outcome = Some(typekit.clone());
        }
        drop(claim);
        result
    }

    /// Like [`import`](Self::import), but a missing typekit is an error.
    pub fn require(&self, name: &str) -> ForgeResult<Arc<Typekit>> {
        self.import(name)?.ok_or_else(|| {
            ApplicationError::TypekitNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn resolution(&self, name: &str) -> Resolution {
        match self.entries.lock().get(name) {
            None => Resolution::Unresolved,
            Some(Entry::Resolving) => Resolution::Resolving,
            Some(Entry::Resolved(typekit)) => Resolution::Resolved(typekit.clone()),
        }
    }

    /// Names the source can provide.
    pub fn available(&self) -> ForgeResult<Vec<String>> {
        self.source.available()
    }

    fn load(&self, name: &str) -> ForgeResult<Option<Arc<Typekit>>> {
        let Some(raw) = self.source.load(name)? else {
            debug!(typekit = name, "No such typekit");
            return Ok(None);
        };
        let descriptor = self.parser.parse(&raw.name, &raw.descriptor)?;
        let typelist = Typelist::parse(&raw.typelist)?;
        let package = raw
            .package
            .as_deref()
            .map(|pkg| self.packages.resolve(pkg))
            .transpose()?;

        let typekit = Typekit::from_parts(raw.name, package, descriptor, typelist)?;
        info!(
            typekit = typekit.name(),
            types = typekit.typelist().all.len(),
            opaques = typekit.opaques().len(),
            "Typekit loaded"
        );
        Ok(Some(Arc::new(typekit)))
    }
}

/// A name this caller is loading. Dropping it settles the entry and wakes
/// the waiters, also when the load unwinds.
struct Claim<'a> {
    importer: &'a TypekitImporter,
    name: &'a str,
    outcome: Option<Option<Arc<Typekit>>>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut entries = self.importer.entries.lock();
        match self.outcome.take() {
            Some(typekit) => {
                entries.insert(self.name.to_string(), Entry::Resolved(typekit));
            }
            None => {
                entries.remove(self.name);
            }
        }
        drop(entries);
        self.importer.settled.notify_all();
    }
}
