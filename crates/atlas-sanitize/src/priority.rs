//! Type priority for merged entities.
//!
//! When several raw nodes collapse into one canonical node, the displayed
//! type migrates toward the most specific label seen. Ranks only ever go up.

use atlas_core::DEFAULT_NODE_TYPE;

/// Rank for labels missing from [`TYPE_PRIORITY`].
pub const DEFAULT_TYPE_PRIORITY: u32 = 10;

/// Lowercased type label → rank. Immutable; never extended at runtime.
pub const TYPE_PRIORITY: &[(&str, u32)] = &[
    ("人", 100),
    ("人物", 100),
    ("person", 100),
    ("组织", 90),
    ("机构", 90),
    ("公司", 90),
    ("organization", 90),
    ("事件", 80),
    ("event", 80),
    ("paper", 80),
    ("article", 80),
    ("参考文献", 80),
    ("技术", 70),
    ("technology", 70),
    ("研究方向", 70),
    ("research direction", 70),
    ("概念", 60),
    ("概念概念", 60),
    ("concept", 60),
    ("产品", 60),
    ("product", 60),
    ("工具", 60),
    ("tool", 60),
    ("领域", 60),
    ("domain", 60),
    ("framework", 50),
    ("language", 50),
];

/// Rank of a type label. Blank labels rank as the default node type.
pub fn type_rank(label: &str) -> u32 {
    let label = blank_as_default(label).to_lowercase();
    TYPE_PRIORITY
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, rank)| *rank)
        .unwrap_or(DEFAULT_TYPE_PRIORITY)
}

/// Pick the type a canonical node keeps after merging `candidate` into it.
///
/// The candidate wins only with a strictly higher rank; ties keep the
/// incumbent.
pub fn resolve_type<'a>(current: &'a str, candidate: &'a str) -> &'a str {
    let current = blank_as_default(current);
    let candidate = blank_as_default(candidate);
    if type_rank(candidate) > type_rank(current) {
        candidate
    } else {
        current
    }
}

fn blank_as_default(label: &str) -> &str {
    if label.trim().is_empty() {
        DEFAULT_NODE_TYPE
    } else {
        label
    }
}
