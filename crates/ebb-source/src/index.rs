//! Content index: one lazy loader per compiled module.

use std::path::Path;

use walkdir::WalkDir;

use ebb_mdx::estree::js_string_literal;

/// Generate the index module for the compiled modules under `source_dir`.
///
/// Entries are keyed by the module path relative to `source_dir`, with
/// forward slashes and no `.js` extension, and sorted by key.
pub fn generate_index(source_dir: &Path) -> String {
    let mut modules: Vec<String> = WalkDir::new(source_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "js"))
        .filter_map(|e| {
            let relative = e.path().strip_prefix(source_dir).ok()?;
            Some(relative.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    modules.sort();

    let mut out = String::from("export default {\n");
    for module in &modules {
        let key = module.strip_suffix(".js").unwrap_or(module);
        out.push_str(&format!(
            "  {}: () => import({}),\n",
            js_string_literal(key),
            js_string_literal(&format!("./source/{module}"))
        ));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_modules_sorted() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("source");
        fs::create_dir_all(source.join("guide")).unwrap();
        fs::write(source.join("zeta.js"), "").unwrap();
        fs::write(source.join("guide/intro.js"), "").unwrap();
        fs::write(source.join("guide/notes.txt"), "").unwrap();
        fs::write(source.join("about.js"), "").unwrap();

        assert_eq!(
            generate_index(&source),
            r#"export default {
  "about": () => import("./source/about.js"),
  "guide/intro": () => import("./source/guide/intro.js"),
  "zeta": () => import("./source/zeta.js"),
}
"#
        );
    }

    #[test]
    fn missing_directory_gives_empty_index() {
        let temp = tempdir().unwrap();
        assert_eq!(generate_index(&temp.path().join("source")), "export default {\n}\n");
    }
}
