//! Raw tag dump for a single file

use crate::error::Result;
use crate::tags::read_tags;
use std::path::Path;

/// Diagnostic lines for both tags of a file; unreadable tags show their cause
pub fn inspect(path: &Path) -> Result<Vec<String>> {
    let tags = read_tags(path)?;
    let mut lines = vec!["ID3V1:".to_string()];
    match &tags.v1 {
        Ok(tag) => lines.extend(tag.diagnostics().into_iter().map(|l| format!("  {}", l))),
        Err(e) => lines.push(format!("  {}", e)),
    }
    lines.push("ID3V2:".to_string());
    match &tags.v2 {
        Ok(tag) => lines.extend(tag.diagnostics().into_iter().map(|l| format!("  {}", l))),
        Err(e) => lines.push(format!("  {}", e)),
    }
    Ok(lines)
}
