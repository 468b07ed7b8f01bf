//! Directory listing module
//!
//! Generated HTML index for directories without an index document.

use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tokio::fs;

/// Render an HTML listing of `dir`, shown as `display_path`
///
/// Entries are sorted case-insensitively; directories get a trailing `/`.
pub async fn render(dir: &Path, display_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push((name, is_dir));
    }
    entries.sort_by_key(|(name, _)| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>");
    let _ = writeln!(html, "<h1>{title}</h1>\n<hr>\n<ul>");
    for (name, is_dir) in &entries {
        let suffix = if *is_dir { "/" } else { "" };
        let _ = writeln!(
            html,
            "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>",
            urlencoding::encode(name),
            escape_html(name),
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Ok(html)
}

/// Escape text for HTML element and attribute content
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
    }

    #[tokio::test]
    async fn test_render_sorted_with_dirs_marked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("A file.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();

        let html = render(dir.path(), "/static/").await.unwrap();
        assert!(html.contains("<title>Directory listing for /static/</title>"));
        assert!(html.contains("<a href=\"css/\">css/</a>"));
        assert!(html.contains("<a href=\"A%20file.txt\">A file.txt</a>"));

        let a = html.find("A file.txt").unwrap();
        let b = html.find("b.txt").unwrap();
        let css = html.find("css/").unwrap();
        assert!(a < b && b < css);
    }

    #[tokio::test]
    async fn test_render_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render(&dir.path().join("nope"), "/nope/").await.is_err());
    }
}
