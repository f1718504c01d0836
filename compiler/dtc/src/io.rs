//! IO module for reading contract files

use std::{fs, path::Path};

use anyhow::Context;

/// Read the contract declarations listed in the file at `path`
///
/// Each non-empty line is one declaration. Lines whose first non-blank
/// character is `#` are comments.
pub fn read_contracts(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read contracts from {}", path.display()))?;

    Ok(parse_contract_lines(&content))
}

/// Split the content of a contract file into its declarations
fn parse_contract_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
