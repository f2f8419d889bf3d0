//! Parser for text catalog files.
//!
//! Format, one item per line:
//!
//! ```text
//! id::type::color|color::brand|brand::price
//! 1::shirt::blue|white|black::Nike|Adidas::50
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::error::{CatalogError, Result};
use crate::types::{CatalogItem, ClothingType};
use std::fs;
use std::path::Path;

const FIELD_COUNT: usize = 5;

/// Parse a catalog file from disk
pub fn parse_catalog(path: &Path) -> Result<Vec<CatalogItem>> {
    let content = fs::read_to_string(path)?;
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_catalog_str(&content, &file)
}

/// Parse catalog text; `file` is only used for error messages
pub fn parse_catalog_str(content: &str, file: &str) -> Result<Vec<CatalogItem>> {
    let mut items = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() || line_trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line_trimmed.split("::").collect();
        if parts.len() != FIELD_COUNT {
            return Err(CatalogError::FieldCountMismatch {
                expected: FIELD_COUNT,
                found: parts.len(),
                line: line_no,
            });
        }

        let parse_error = |reason: String| CatalogError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason,
        };

        let item = CatalogItem {
            id: parts[0]
                .trim()
                .parse()
                .map_err(|e| parse_error(format!("Invalid id: {}", e)))?,
            clothing_type: parse_clothing_type(parts[1])
                .map_err(|_| parse_error(format!("Unknown clothing type '{}'", parts[1])))?,
            colors: parse_list(parts[2]),
            brands: parse_list(parts[3]),
            price: parts[4]
                .trim()
                .parse()
                .map_err(|e| parse_error(format!("Invalid price: {}", e)))?,
        };

        items.push(item);
    }

    Ok(items)
}

/// Catalog files must name a real category; `unknown` is reserved for
/// detector output.
fn parse_clothing_type(s: &str) -> Result<ClothingType> {
    match s.parse::<ClothingType>()? {
        ClothingType::Unknown => Err(CatalogError::InvalidValue {
            field: "type".to_string(),
            value: s.to_string(),
        }),
        clothing_type => Ok(clothing_type),
    }
}

/// Parse a pipe-separated list, dropping empty entries
///
/// Example: "blue|white|" -> vec!["blue", "white"]
fn parse_list(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
