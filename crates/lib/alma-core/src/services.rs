use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{ArchiveBackend, BackendSelector};
use crate::query::TableAllowList;
use crate::resolver::NameResolver;

pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Which collaborators were configured at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub name_resolver: bool,
    pub cone_search: bool,
    pub declarative: bool,
}

impl Capabilities {
    /// True when at least one backend can run positional searches.
    #[must_use]
    pub const fn positional(self) -> bool {
        self.cone_search || self.declarative
    }
}

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct ArchiveServices {
    selector: BackendSelector,
    resolver: Option<Arc<dyn NameResolver>>,
    capabilities: Capabilities,
    allow_list: TableAllowList,
    batch_concurrency: usize,
}

impl ArchiveServices {
    /// Bundles the configured collaborators and records what is available.
    #[must_use]
    pub fn new(
        declarative: Option<Arc<dyn ArchiveBackend>>,
        cone: Option<Arc<dyn ArchiveBackend>>,
        resolver: Option<Arc<dyn NameResolver>>,
    ) -> Self {
        let capabilities = Capabilities {
            name_resolver: resolver.is_some(),
            cone_search: cone.is_some(),
            declarative: declarative.is_some(),
        };
        Self {
            selector: BackendSelector::new(declarative, cone),
            resolver,
            capabilities,
            allow_list: TableAllowList::default(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_allow_list(mut self, allow_list: TableAllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    #[must_use]
    pub const fn with_batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.batch_concurrency = if batch_concurrency == 0 { 1 } else { batch_concurrency };
        self
    }

    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[must_use]
    pub const fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    #[must_use]
    pub fn resolver(&self) -> Option<&Arc<dyn NameResolver>> {
        self.resolver.as_ref()
    }

    #[must_use]
    pub const fn allow_list(&self) -> &TableAllowList {
        &self.allow_list
    }

    #[must_use]
    pub const fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_follow_configured_collaborators() {
        let services = ArchiveServices::new(None, None, None).with_batch_concurrency(0);
        assert_eq!(services.capabilities(), Capabilities::default());
        assert!(!services.capabilities().positional());
        assert_eq!(services.batch_concurrency(), 1);
    }

    #[test]
    fn batch_concurrency_defaults_to_four() {
        let services = ArchiveServices::new(None, None, None);
        assert_eq!(services.batch_concurrency(), DEFAULT_BATCH_CONCURRENCY);
        assert_eq!(DEFAULT_BATCH_CONCURRENCY, 4);
    }
}
