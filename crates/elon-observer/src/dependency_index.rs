//! Dependency index (§4.5 step 5): static scan of routes/services/pages/
//! schema, mapping endpoints to the files that implement them.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Route,
    Service,
    Page,
    Schema,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyIndex {
    /// endpoint path -> files that implement it
    pub endpoint_to_files: BTreeMap<String, Vec<Utf8PathBuf>>,
}

/// Very small heuristic route scanner: looks for common route-registration
/// call shapes (`app.get("/x", ...)`, `router.post('/x', ...)`,
/// `@Get('/x')`) inside files under conventional directories, mapping the
/// literal path string to the file it appeared in.
pub fn build_index(repo_root: &Utf8Path, sources: &[(Utf8PathBuf, SourceKind)]) -> DependencyIndex {
    let mut endpoint_to_files: BTreeMap<String, Vec<Utf8PathBuf>> = BTreeMap::new();

    for (relative_path, kind) in sources {
        if !matches!(kind, SourceKind::Route | SourceKind::Page) {
            continue;
        }
        let absolute = repo_root.join(relative_path);
        let Ok(content) = std::fs::read_to_string(&absolute) else {
            continue;
        };
        for endpoint in extract_route_literals(&content) {
            endpoint_to_files.entry(endpoint).or_default().push(relative_path.clone());
        }
    }

    DependencyIndex { endpoint_to_files }
}

fn extract_route_literals(content: &str) -> Vec<String> {
    let mut routes = Vec::new();
    let http_verbs = ["get", "post", "put", "patch", "delete"];

    for verb in http_verbs {
        let mut search_from = 0;
        let needle = format!(".{verb}(");
        while let Some(rel_idx) = content[search_from..].find(&needle) {
            let start = search_from + rel_idx + needle.len();
            if let Some(path) = extract_quoted_literal(&content[start..]) {
                if path.starts_with('/') {
                    routes.push(path);
                }
            }
            search_from = start;
        }
    }
    routes.sort();
    routes.dedup();
    routes
}

fn extract_quoted_literal(rest: &str) -> Option<String> {
    let trimmed = rest.trim_start();
    let quote = trimmed.chars().next()?;
    if quote != '"' && quote != '\'' && quote != '`' {
        return None;
    }
    let body = &trimmed[1..];
    let end = body.find(quote)?;
    Some(body[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn maps_express_style_route_to_file() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            dir.path().join("routes.ts"),
            r#"app.get("/api/users", handler); router.post('/api/orders', handler2);"#,
        )
        .unwrap();

        let index = build_index(&root, &[(Utf8PathBuf::from("routes.ts"), SourceKind::Route)]);
        assert!(index.endpoint_to_files.contains_key("/api/users"));
        assert!(index.endpoint_to_files.contains_key("/api/orders"));
    }

    #[test]
    fn non_route_source_kinds_are_skipped() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("schema.ts"), r#"app.get("/ignored", x);"#).unwrap();

        let index = build_index(&root, &[(Utf8PathBuf::from("schema.ts"), SourceKind::Schema)]);
        assert!(index.endpoint_to_files.is_empty());
    }
}
