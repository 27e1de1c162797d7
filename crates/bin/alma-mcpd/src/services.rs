use std::sync::Arc;

use alma_core::backend::{ArchiveBackend, SiaConeBackend, TapBackend};
use alma_core::query::TableAllowList;
use alma_core::resolver::{NameResolver, SesameResolver};
use alma_core::services::ArchiveServices;
use tracing::{info, warn};

use crate::config::AlmaConfig;

/// Builds the shared HTTP client and every enabled collaborator.
///
/// # Errors
/// Returns the client builder error when TLS initialization fails.
pub fn build_services(config: &AlmaConfig) -> Result<ArchiveServices, reqwest::Error> {
    let client = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(concat!("alma-mcpd/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let declarative = config.tap_url.as_ref().map(|url| {
        let backend: Arc<dyn ArchiveBackend> = Arc::new(TapBackend::new(client.clone(), url.as_str()));
        backend
    });
    let cone = config.sia_url.as_ref().map(|url| {
        let backend: Arc<dyn ArchiveBackend> =
            Arc::new(SiaConeBackend::new(client.clone(), url.as_str()));
        backend
    });
    let resolver = config.resolver_url.as_ref().map(|url| {
        let resolver: Arc<dyn NameResolver> = Arc::new(SesameResolver::new(client.clone(), url.clone()));
        resolver
    });

    let services = ArchiveServices::new(declarative, cone, resolver)
        .with_allow_list(TableAllowList::default().with_tables(&config.raw_query_tables))
        .with_batch_concurrency(config.batch_concurrency);

    let capabilities = services.capabilities();
    info!(
        tap = capabilities.declarative,
        cone_search = capabilities.cone_search,
        name_resolver = capabilities.name_resolver,
        batch_concurrency = services.batch_concurrency(),
        "archive services configured"
    );
    if !capabilities.positional() {
        warn!("no archive backend is enabled; every search tool will report unavailable");
    }
    Ok(services)
}
