//! Structural-noise filter.
//!
//! Extractors sometimes return document-layout tokens ("Chapter 3",
//! "第二章", "chunk-7") as if they were entities. Each rejection reason is a
//! [`StructureRule`] so rules can be tested and logged individually.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Layout keywords that never name a real entity.
pub const STRUCTURE_KEYWORDS: [&str; 10] = [
    "chunk",
    "section",
    "paragraph",
    "chapter",
    "part",
    "page",
    "step",
    "item",
    "lesson",
    "segment",
];

/// "Chapter 3", "section-iv", "Step_2", "page#10".
static ENGLISH_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:chunk|section|paragraph|chapter|part|page|step|item|lesson|segment)[\s\-_#]*(?:\d+|[ivxlcdm]+)$",
    )
    .expect("english marker pattern is valid")
});

/// "第二章", "第 3节", "第十二部分". Anchored at the end only.
static CHINESE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"第\s*[零一二三四五六七八九十百千\d]+(?:章节|部分|篇|节|段|章)$")
        .expect("chinese marker pattern is valid")
});

/// Why a raw node was rejected as structural noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureRule {
    /// Id is empty after trimming.
    EmptyId,
    /// Id contains `#` or `/` (anchors, paths, URLs).
    PathLikeId,
    /// Id is a layout keyword followed by a number or roman numeral.
    EnglishMarker,
    /// Id ends in a Chinese chapter/section marker.
    ChineseMarker,
    /// Id starts with a layout keyword.
    KeywordPrefix,
    /// Declared type is a layout keyword.
    StructuralType,
}

impl StructureRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyId => "empty_id",
            Self::PathLikeId => "path_like_id",
            Self::EnglishMarker => "english_marker",
            Self::ChineseMarker => "chinese_marker",
            Self::KeywordPrefix => "keyword_prefix",
            Self::StructuralType => "structural_type",
        }
    }
}

impl fmt::Display for StructureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return the first rule the node violates, or `None` if it is a real entity.
///
/// `id` and `node_type` are the raw values; both are trimmed here.
pub fn structural_rule(id: &str, node_type: &str) -> Option<StructureRule> {
    let id = id.trim();
    if id.is_empty() {
        return Some(StructureRule::EmptyId);
    }
    if id.contains('#') || id.contains('/') {
        return Some(StructureRule::PathLikeId);
    }
    if ENGLISH_MARKER.is_match(id) {
        return Some(StructureRule::EnglishMarker);
    }
    if CHINESE_MARKER.is_match(id) {
        return Some(StructureRule::ChineseMarker);
    }

    let id_lower = id.to_lowercase();
    if STRUCTURE_KEYWORDS.iter().any(|kw| id_lower.starts_with(kw)) {
        return Some(StructureRule::KeywordPrefix);
    }

    let type_lower = node_type.trim().to_lowercase();
    if STRUCTURE_KEYWORDS.contains(&type_lower.as_str()) {
        return Some(StructureRule::StructuralType);
    }

    None
}

pub fn is_structural(id: &str, node_type: &str) -> bool {
    structural_rule(id, node_type).is_some()
}
