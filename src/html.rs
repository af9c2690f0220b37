//! HTML rendering for directory listing pages.

use humansize::{format_size, BINARY};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::listing::DirectoryListing;

/// Characters percent-encoded inside an href path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|');

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #f4f5f7;
            color: #333;
            line-height: 1.6;
        }
        .container {
            max-width: 960px;
            margin: 2rem auto;
            padding: 1.5rem;
            background: #fff;
            border-radius: 8px;
            box-shadow: 0 1px 6px rgba(0,0,0,0.12);
        }
        header { border-bottom: 1px solid #e8e8e8; padding-bottom: 1rem; margin-bottom: 1rem; }
        h1 { font-size: 1.5rem; color: #2c3e50; }
        .breadcrumb { color: #7f8c8d; font-size: 0.9em; }
        .breadcrumb a { color: #2980b9; text-decoration: none; }
        .breadcrumb a:hover { text-decoration: underline; }
        ul { list-style: none; }
        .entry {
            display: flex;
            align-items: center;
            padding: 0.6rem 0.8rem;
            border-radius: 4px;
            color: #34495e;
            text-decoration: none;
        }
        .entry:hover { background: #f0f4f8; }
        .name { flex: 1; margin-left: 0.6rem; word-break: break-all; }
        .size { color: #95a5a6; font-size: 0.9em; }
        .zip { margin-left: 0.8rem; font-size: 0.85em; color: #2980b9; text-decoration: none; }
        .upload { margin-top: 1.5rem; padding-top: 1rem; border-top: 1px solid #e8e8e8; }
        @media (max-width: 600px) { .container { margin: 0.5rem; } .size { display: none; } }
"#;

/// Render a listing page: breadcrumbs, an "up" link unless the listing is the
/// root, directory rows (browse link + zip download), file rows (download
/// link + size), and the upload form.
pub fn listing_page(listing: &DirectoryListing) -> String {
    let mut rows = Vec::new();

    if let Some(parent) = &listing.parent {
        rows.push(format!(
            r#"<li><a href="{}" class="entry">&#8617;<span class="name">..</span></a></li>"#,
            browse_href(parent)
        ));
    }

    for dir in &listing.dirs {
        let child = join_relative(&listing.current, dir);
        rows.push(format!(
            r#"<li><a href="{}" class="entry">&#128193;<span class="name">{}</span></a><a href="/download_directory/{}" class="zip">download .zip</a></li>"#,
            browse_href(&child),
            html_escape::encode_text(dir),
            encode_path(&child),
        ));
    }

    for file in &listing.files {
        let child = join_relative(&listing.current, &file.name);
        rows.push(format!(
            r#"<li><a href="/download/{}" class="entry">&#128196;<span class="name">{}</span><span class="size">{}</span></a></li>"#,
            encode_path(&child),
            html_escape::encode_text(&file.name),
            format_size(file.size, BINARY),
        ));
    }

    let title = if listing.current.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", listing.current)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>lanshare - {title}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<header>
<h1>{title}</h1>
<nav class="breadcrumb">{crumbs}</nav>
</header>
<ul>{rows}</ul>
<div class="upload">
<form action="/upload" method="post" enctype="multipart/form-data">
<input type="file" name="file">
<button type="submit">Upload</button>
</form>
</div>
</div>
</body>
</html>"#,
        title = html_escape::encode_text(&title),
        crumbs = breadcrumbs(&listing.current),
        rows = rows.join("\n"),
    )
}

fn breadcrumbs(current: &str) -> String {
    let mut crumbs = vec![(String::new(), "Home".to_string())];
    let mut accumulated = String::new();

    for part in current.split('/').filter(|p| !p.is_empty()) {
        if !accumulated.is_empty() {
            accumulated.push('/');
        }
        accumulated.push_str(part);
        crumbs.push((accumulated.clone(), part.to_string()));
    }

    crumbs
        .iter()
        .enumerate()
        .map(|(i, (relative, name))| {
            let name = html_escape::encode_text(name);
            if i == crumbs.len() - 1 {
                format!("<span>{name}</span>")
            } else {
                format!(r#"<a href="{}">{name}</a> / "#, browse_href(relative))
            }
        })
        .collect()
}

fn browse_href(relative: &str) -> String {
    if relative.is_empty() {
        "/browse".to_string()
    } else {
        format!("/browse/{}", encode_path(relative))
    }
}

fn join_relative(current: &str, name: &str) -> String {
    if current.is_empty() {
        name.to_string()
    } else {
        format!("{current}/{name}")
    }
}

fn encode_path(relative: &str) -> String {
    relative
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::FileEntry;

    fn sample(current: &str, parent: Option<&str>) -> DirectoryListing {
        DirectoryListing {
            files: vec![FileEntry {
                name: "a & b.txt".to_string(),
                size: 2048,
            }],
            dirs: vec!["music".to_string()],
            current: current.to_string(),
            parent: parent.map(str::to_string),
        }
    }

    #[test]
    fn root_listing_has_no_up_link() {
        let page = listing_page(&sample("", None));
        assert!(!page.contains(r#"<span class="name">..</span>"#));
        assert!(page.contains("a &amp; b.txt"));
        assert!(page.contains("/browse/music"));
        assert!(page.contains("/download_directory/music"));
    }

    #[test]
    fn nested_listing_links_up_and_escapes_hrefs() {
        let page = listing_page(&sample("docs/my files", Some("docs")));
        assert!(page.contains(r#"href="/browse/docs""#));
        assert!(page.contains("/download/docs/my%20files/a%20%26%20b.txt"));
    }

    #[test]
    fn single_segment_up_link_points_at_root() {
        let page = listing_page(&sample("docs", Some("")));
        assert!(page.contains(r#"<a href="/browse" class="entry">"#));
    }
}
