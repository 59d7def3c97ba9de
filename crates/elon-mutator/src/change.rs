//! `applyChange` (§4.2): exact-substring or unique line-trimmed fuzzy
//! match, replacing exactly one occurrence.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("oldText not found in file")]
    NotFound,
    #[error("oldText matches {0} ambiguous candidate regions")]
    Ambiguous(usize),
}

/// Find the byte range of the unique occurrence of `old_text` in
/// `content`. Tries an exact substring match first; if that's not
/// unique, falls back to a line-trimmed fuzzy match (whitespace
/// normalised per line) and requires that to be unique too.
pub fn locate_unique_match(content: &str, old_text: &str) -> Result<std::ops::Range<usize>, MatchError> {
    let exact: Vec<_> = content.match_indices(old_text).collect();
    if exact.len() == 1 {
        let (start, matched) = exact[0];
        return Ok(start..start + matched.len());
    }
    if exact.len() > 1 {
        return Err(MatchError::Ambiguous(exact.len()));
    }

    locate_fuzzy_match(content, old_text)
}

/// Line-trimmed fuzzy match: both `content` and `old_text` are split
/// into lines with each line's surrounding whitespace stripped, then we
/// look for the run of lines in `content` whose trimmed form equals
/// `old_text`'s trimmed lines. Returns the byte range of the full
/// (untrimmed) matching region in the original content.
fn locate_fuzzy_match(content: &str, old_text: &str) -> Result<std::ops::Range<usize>, MatchError> {
    let needle_lines: Vec<&str> = old_text.lines().map(str::trim).collect();
    if needle_lines.is_empty() {
        return Err(MatchError::NotFound);
    }

    let content_lines: Vec<&str> = content.lines().collect();
    let line_starts = line_byte_offsets(content);

    let mut matches = Vec::new();
    if content_lines.len() >= needle_lines.len() {
        for start_idx in 0..=(content_lines.len() - needle_lines.len()) {
            let window = &content_lines[start_idx..start_idx + needle_lines.len()];
            if window.iter().map(|l| l.trim()).eq(needle_lines.iter().copied()) {
                let end_idx = start_idx + needle_lines.len() - 1;
                let start_byte = line_starts[start_idx];
                let end_byte = line_starts[end_idx] + content_lines[end_idx].len();
                matches.push(start_byte..end_byte);
            }
        }
    }

    match matches.len() {
        0 => Err(MatchError::NotFound),
        1 => Ok(matches.into_iter().next().unwrap()),
        n => Err(MatchError::Ambiguous(n)),
    }
}

fn line_byte_offsets(content: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut pos = 0;
    for line in content.lines() {
        pos += line.len();
        if content[pos..].starts_with('\n') {
            pos += 1;
        } else if content[pos..].starts_with("\r\n") {
            pos += 2;
        }
        offsets.push(pos);
    }
    offsets
}

/// Replace the unique occurrence of `old_text` with `new_text`.
pub fn apply(content: &str, old_text: &str, new_text: &str) -> Result<String, MatchError> {
    let range = locate_unique_match(content, old_text)?;
    let mut result = String::with_capacity(content.len());
    result.push_str(&content[..range.start]);
    result.push_str(new_text);
    result.push_str(&content[range.end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_replaced() {
        let out = apply("function f() { return 1; }", "return 1;", "return 2;").unwrap();
        assert_eq!(out, "function f() { return 2; }");
    }

    #[test]
    fn ambiguous_exact_match_is_refused() {
        let err = apply("a; a;", "a", "b").unwrap_err();
        assert!(matches!(err, MatchError::Ambiguous(2)));
    }

    #[test]
    fn not_found_is_reported() {
        let err = apply("function f() {}", "missing", "x").unwrap_err();
        assert_eq!(err, MatchError::NotFound);
    }

    #[test]
    fn fuzzy_match_tolerates_indentation_difference() {
        let content = "function f() {\n    return 1;\n}\n";
        let old_text = "  return 1;  ";
        let out = apply(content, old_text, "return 2;").unwrap();
        assert!(out.contains("return 2;"));
        assert!(!out.contains("return 1;"));
    }

    #[test]
    fn fuzzy_match_ambiguous_with_two_regions_is_refused() {
        let content = "if (a) {\n  return 1;\n}\nif (b) {\n  return 1;\n}\n";
        let err = apply(content, "return 1;", "return 2;").unwrap_err();
        assert!(matches!(err, MatchError::Ambiguous(2)));
    }

    #[test]
    fn multiline_fuzzy_match_unique() {
        let content = "function f() {\n  const a = 1;\n  const b = 2;\n}\n";
        let old_text = "const a = 1;\nconst b = 2;";
        let out = apply(content, old_text, "const ab = 3;").unwrap();
        assert!(out.contains("const ab = 3;"));
    }
}
