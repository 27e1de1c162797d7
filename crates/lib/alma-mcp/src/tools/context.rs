use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::AlmaMcp;

/// Payload listing every MCP command with a one-line description.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
}

impl Default for HelpCommands {
    fn default() -> Self {
        let commands = [
            "help - List the MCP commands and what they do.",
            "health - Returns 'ok'.",
            "get_alma_info - ALMA bands, common lines, science categories, and service availability.",
            "search_alma_by_target - Resolve an object name and search around it.",
            "search_alma_by_position - Search around ICRS coordinates in degrees.",
            "check_alma_line_coverage - Find observations covering a line at a redshift.",
            "query_alma_multiple_sources - Search up to 20 object names in one call.",
            "search_alma_by_proposal - Search by proposal id, PI name, or science category.",
            "search_alma_by_frequency - Search by frequency range in GHz.",
            "search_alma_by_resolution - Search by angular resolution in arcsec.",
            "search_alma_by_source_name - Search archive target names without resolution.",
            "search_alma_by_bibliography - Search by bibcode, journal, first author, or year.",
            "search_alma_by_member_ous - List every data product of a Member OUS id.",
            "search_alma_by_data_type - Search cubes or images.",
            "search_alma_by_science_keyword - Search by science keyword.",
            "search_alma_by_abstract - Search proposal and publication abstracts.",
            "search_alma_by_sensitivity - Search by continuum or line sensitivity in mJy/beam.",
            "run_alma_tap_query - Run a single ADQL SELECT against ivoa.obscore.",
        ];
        Self {
            commands: commands.iter().map(|command| (*command).to_string()).collect(),
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl AlmaMcp {
    #[tool(description = "List the MCP commands and what they do.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }
}
