//! MCP server implementation for alma-mcp.
//!
//! This crate wires the ALMA control plane into rmcp tool handlers and exposes
//! the MCP-facing API surface for archive searches.

mod helpers;
mod tools;
pub mod server;

use alma_core::control::AlmaControlPlane;
use alma_core::services::{ArchiveServices, Capabilities};
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

const SERVER_INSTRUCTIONS: &str = r"alma-mcp provides MCP tools for searching the ALMA (Atacama Large Millimeter/submillimeter Array) science archive.

Workflow:
1. Positional searches:
   - `search_alma_by_target` resolves an object name (e.g. `M87`, `NGC 1068`) and searches around it.
   - `search_alma_by_position` searches around ICRS coordinates in degrees.
   - `query_alma_multiple_sources` runs a name search for up to 20 names at once.
   - `check_alma_line_coverage` reports which observations cover a spectral line at a redshift.
2. Catalog searches:
   - `search_alma_by_proposal`, `search_alma_by_frequency`, `search_alma_by_resolution`,
     `search_alma_by_source_name`, `search_alma_by_bibliography`, `search_alma_by_member_ous`,
     `search_alma_by_data_type`, `search_alma_by_science_keyword`, `search_alma_by_abstract`,
     `search_alma_by_sensitivity`.
3. Custom queries:
   - `run_alma_tap_query` runs a single ADQL `SELECT` against `ivoa.obscore`.

Notes:
- Frequencies are in GHz, resolutions in arcsec, sensitivities in mJy/beam, radii in arcmin.
- List responses report the full `count` and show at most 20 observations.
- Failures return a JSON mapping with an `error` field instead of results.
- `get_alma_info` lists bands, common lines, and which archive services are available.
- Use `help` for a one-line summary of every tool.
- `health` returns `ok`.";

/// MCP server wrapper around the control plane and tool routers.
#[derive(Clone)]
pub struct AlmaMcp {
    tool_router: ToolRouter<Self>,
    control: AlmaControlPlane,
}

impl AlmaMcp {
    /// Creates a new server over the configured archive services.
    #[must_use]
    pub fn new(services: ArchiveServices) -> Self {
        Self::with_control(AlmaControlPlane::new(services))
    }

    /// Creates a new server around an existing control plane.
    #[must_use]
    pub fn with_control(control: AlmaControlPlane) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_search()
            + Self::tool_router_catalog()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
        }
    }

    /// Which collaborators the server was started with.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.control.capabilities()
    }

    pub(crate) const fn control(&self) -> &AlmaControlPlane {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl AlmaMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for AlmaMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_exposes_every_tool() {
        let server = AlmaMcp::new(ArchiveServices::new(None, None, None));
        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        for expected in [
            "health",
            "help",
            "get_alma_info",
            "search_alma_by_target",
            "search_alma_by_position",
            "check_alma_line_coverage",
            "query_alma_multiple_sources",
            "search_alma_by_proposal",
            "search_alma_by_frequency",
            "search_alma_by_resolution",
            "search_alma_by_source_name",
            "search_alma_by_bibliography",
            "search_alma_by_member_ous",
            "search_alma_by_data_type",
            "search_alma_by_science_keyword",
            "search_alma_by_abstract",
            "search_alma_by_sensitivity",
            "run_alma_tap_query",
        ] {
            assert!(names.iter().any(|name| name == expected), "missing tool {expected}");
        }
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn server_info_carries_instructions() {
        let server = AlmaMcp::new(ArchiveServices::new(None, None, None));
        let info = server.get_info();
        assert!(info
            .instructions
            .as_deref()
            .is_some_and(|text| text.contains("run_alma_tap_query")));
        assert!(info.capabilities.tools.is_some());
        assert!(!server.capabilities().declarative);
    }
}
