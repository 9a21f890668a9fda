//! Comma-separated tag input.

/// Split on commas, trim, drop empties and repeats. First occurrence wins.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|seen| seen == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Wire form expected by the service.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}
