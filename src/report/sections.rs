use indexmap::IndexMap;

/// Keywords that mark a line as a section heading
pub const SECTION_KEYWORDS: [&str; 5] = [
    "Introduction",
    "Methodology",
    "Results",
    "Discussion",
    "Conclusion",
];

/// Split report text into sections keyed by their heading line.
///
/// Any line containing a keyword opens a new section keyed by the trimmed line;
/// following lines are space-joined into its body. Text before the first heading
/// belongs to no section. Sections keep document order; a repeated heading
/// replaces the earlier body in its original position.
#[must_use]
pub fn split_sections(text: &str) -> IndexMap<String, String> {
    let mut sections = IndexMap::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if is_heading(line) {
            if let Some(heading) = current.take() {
                sections.insert(heading, body.join(" ").trim().to_string());
            }
            body.clear();
            current = Some(line.trim().to_string());
        } else if current.is_some() {
            body.push(line);
        }
    }

    if let Some(heading) = current {
        sections.insert(heading, body.join(" ").trim().to_string());
    }

    sections
}

fn is_heading(line: &str) -> bool {
    SECTION_KEYWORDS.iter().any(|keyword| line.contains(keyword))
}
