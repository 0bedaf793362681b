// `tools`: availability and versions of the external programs

use super::CommandContext;
use crate::downloader::tools::{ToolInfo, ToolType};
use crate::downloader::ToolManager;

/// Succeeds when at least one yt-dlp flavour can run.
pub async fn execute(ctx: &CommandContext, json: bool) -> bool {
    let tools = match ToolManager::new(ctx.tools.clone())
        .get_all_tools(&ctx.limits)
        .await
    {
        Ok(tools) => tools,
        Err(e) => {
            eprintln!("Error: {}", e);
            return false;
        }
    };

    if json {
        match serde_json::to_string_pretty(&tools) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: Failed to encode tool report: {}", e);
                return false;
            }
        }
    } else {
        for tool in &tools {
            println!("{}", describe(tool));
        }
    }

    let usable = has_extractor(&tools);
    if !usable {
        eprintln!("Error: neither yt-dlp nor the python yt_dlp module is available");
    }
    usable
}

fn has_extractor(tools: &[ToolInfo]) -> bool {
    tools
        .iter()
        .any(|t| t.is_available && t.tool_type != ToolType::Ffmpeg)
}

fn describe(tool: &ToolInfo) -> String {
    match (&tool.version, &tool.path) {
        (Some(version), Some(path)) => format!("  ✓ {} {} ({})", tool.name, version, path),
        (Some(version), None) => format!("  ✓ {} {}", tool.name, version),
        _ => format!("  ✗ {} not found", tool.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(tool_type: ToolType, version: Option<&str>) -> ToolInfo {
        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version: version.map(|v| v.to_string()),
            path: version.map(|_| "/usr/bin/tool".to_string()),
            is_available: version.is_some(),
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&tool(ToolType::YtDlp, Some("2024.08.06"))),
            "  ✓ yt-dlp 2024.08.06 (/usr/bin/tool)"
        );
        assert_eq!(describe(&tool(ToolType::Ffmpeg, None)), "  ✗ ffmpeg not found");
    }

    #[test]
    fn test_ffmpeg_alone_is_not_enough() {
        assert!(!has_extractor(&[
            tool(ToolType::YtDlp, None),
            tool(ToolType::PythonYtDlp, None),
            tool(ToolType::Ffmpeg, Some("7.0")),
        ]));
        assert!(has_extractor(&[tool(ToolType::PythonYtDlp, Some("2024.08.06"))]));
    }
}
