use crate::mcp::{CallToolParams, CallToolResult, ParamSpec, ParamType, ToolDescriptor, ToolHandler};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Directory listed when the caller does not name one
pub const DEFAULT_DIRECTORY: &str = ".";

/// List files in a directory.
///
/// Returns the names of the immediate entries joined by `\n`, in the order
/// the filesystem yields them. Any failure is reported in the returned
/// string as `Error: <reason>: '<directory>'`; this function never fails.
#[inline]
pub fn list_files(directory: impl AsRef<Path>) -> String {
    let directory = directory.as_ref();
    match entry_names(directory) {
        Ok(names) => names.join("\n"),
        Err(e) => {
            debug!("Listing {} failed: {}", directory.display(), e);
            format!("Error: {}: '{}'", e, directory.display())
        }
    }
}

fn entry_names(directory: &Path) -> io::Result<Vec<String>> {
    fs::read_dir(directory)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect()
}

fn default_directory() -> String {
    DEFAULT_DIRECTORY.to_string()
}

#[derive(Debug, Deserialize)]
struct ListFilesArgs {
    #[serde(default = "default_directory")]
    directory: String,
}

/// `list_files` tool handler
pub struct ListFilesHandler;

impl ListFilesHandler {
    #[inline]
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "list_files",
            "List files in a directory",
            vec![ParamSpec::optional(
                "directory",
                ParamType::String,
                "Directory to list",
                Value::from(DEFAULT_DIRECTORY),
            )],
            ParamType::String,
        )
    }
}

#[async_trait]
impl ToolHandler for ListFilesHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args: ListFilesArgs = match super::parse_arguments(params) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        let listing = list_files(&args.directory);
        Ok(CallToolResult::text(listing.clone()).with_result(Value::String(listing)))
    }
}
