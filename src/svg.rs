//! Rewrites the statistics SVG templates in place.
//!
//! Each template carries elements with well-known `id`s whose text content is
//! the rendered value, plus a `<id>_dots` sibling holding the dot leader that
//! keeps the column aligned. Only text content changes; the markup around it
//! is left untouched so the templates stay hand-editable.

use std::fs;
use std::io;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::stats::{ProfileStats, with_commas};

/// Rewrites one template with the given statistics.
///
/// # Errors
///
/// Fails on I/O errors reading or writing the template.
pub fn overwrite(path: &Path, stats: &ProfileStats) -> io::Result<()> {
    debug!("rewriting template {path:?}…");
    let mut content = fs::read_to_string(path)?;

    replace_text(&mut content, path, "age_data", &stats.age)?;
    justify(&mut content, path, "commit_data", &with_commas(stats.commits), 22)?;
    justify(&mut content, path, "star_data", &with_commas(stats.stars), 14)?;
    justify(&mut content, path, "repo_data", &with_commas(stats.repos), 6)?;
    justify(&mut content, path, "contrib_data", &with_commas(stats.contributed), 0)?;
    justify(&mut content, path, "follower_data", &with_commas(stats.followers), 10)?;
    justify(&mut content, path, "loc_data", &with_commas(stats.loc.net()), 9)?;
    justify(&mut content, path, "loc_add", &with_commas(stats.loc.added), 0)?;
    justify(&mut content, path, "loc_del", &with_commas(stats.loc.deleted), 7)?;

    fs::write(path, content)
}

/// Replaces the element text and pads its `_dots` sibling so the column stays
/// aligned at `width` characters.
fn justify(
    content: &mut String,
    path: &Path,
    id: &str,
    text: &str,
    width: usize,
) -> io::Result<()> {
    replace_text(content, path, id, text)?;
    let leader = dot_leader(text.chars().count(), width);
    replace_text(content, path, &format!("{id}_dots"), &leader)
}

/// The dot leader filling the gap between a label and a `width`-wide value.
fn dot_leader(text_len: usize, width: usize) -> String {
    match width.saturating_sub(text_len) {
        0 => String::new(),
        1 => " ".to_owned(),
        2 => ". ".to_owned(),
        gap => format!(" {} ", ".".repeat(gap)),
    }
}

/// Replaces the text content of the element carrying the given `id`.
///
/// A missing element is logged and tolerated: templates are free to drop
/// fields they do not display.
fn replace_text(content: &mut String, path: &Path, id: &str, text: &str) -> io::Result<()> {
    let pattern = format!(r#"(<[^<>]*\bid="{id}"[^<>]*>)[^<]*"#);
    let regex = Regex::new(&pattern).map_err(io::Error::other)?;

    if !regex.is_match(content) {
        warn!("no element with id {id:?} in template {path:?}");
        return Ok(());
    }

    let text = text.to_owned();
    *content = regex
        .replace(content, |caps: &Captures<'_>| format!("{}{}", &caps[1], text))
        .into_owned();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::LocTotals;
    use tempfile::TempDir;

    const TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg">
<text><tspan id="age_data">old age</tspan></text>
<text><tspan id="commit_data_dots">....</tspan><tspan id="commit_data">0</tspan></text>
<text><tspan id="star_data_dots"></tspan><tspan id="star_data">0</tspan></text>
<text><tspan id="repo_data_dots"></tspan><tspan id="repo_data">0</tspan></text>
<text><tspan id="contrib_data_dots"></tspan><tspan id="contrib_data">0</tspan></text>
<text><tspan id="follower_data_dots"></tspan><tspan id="follower_data">0</tspan></text>
<text><tspan id="loc_data_dots"></tspan><tspan id="loc_data">0</tspan></text>
<text><tspan id="loc_add_dots"></tspan><tspan id="loc_add">0</tspan></text>
<text><tspan id="loc_del_dots"></tspan><tspan id="loc_del">0</tspan></text>
</svg>"##;

    fn stats() -> ProfileStats {
        ProfileStats {
            age: "20 years, 5 months, 23 days".to_owned(),
            commits: 4321,
            stars: 87,
            repos: 42,
            contributed: 55,
            followers: 1234,
            loc: LocTotals {
                added: 250000,
                deleted: 100000,
                from_cache: true,
            },
        }
    }

    #[test]
    fn overwrite_replaces_every_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("card.svg");
        fs::write(&path, TEMPLATE).unwrap();

        overwrite(&path, &stats()).unwrap();
        let rewritten = fs::read_to_string(&path).unwrap();

        assert!(rewritten.contains(r#"<tspan id="age_data">20 years, 5 months, 23 days</tspan>"#));
        assert!(rewritten.contains(r#"<tspan id="commit_data">4,321</tspan>"#));
        assert!(rewritten.contains(r#"<tspan id="follower_data">1,234</tspan>"#));
        assert!(rewritten.contains(r#"<tspan id="loc_data">150,000</tspan>"#));
        // Markup outside the text content is untouched.
        assert!(rewritten.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg">"#));
    }

    #[test]
    fn dots_pad_to_the_column_width() {
        // "4,321" is 5 characters wide in a 22-wide column.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("card.svg");
        fs::write(&path, TEMPLATE).unwrap();

        overwrite(&path, &stats()).unwrap();
        let rewritten = fs::read_to_string(&path).unwrap();

        let expected = format!(r#"<tspan id="commit_data_dots"> {} </tspan>"#, ".".repeat(17));
        assert!(rewritten.contains(&expected));
    }

    #[test]
    fn small_gaps_use_the_fixed_leaders() {
        assert_eq!(dot_leader(5, 5), "");
        assert_eq!(dot_leader(4, 5), " ");
        assert_eq!(dot_leader(3, 5), ". ");
        assert_eq!(dot_leader(1, 5), format!(" {} ", "...."));
        assert_eq!(dot_leader(9, 5), "");
    }

    #[test]
    fn missing_elements_are_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("card.svg");
        fs::write(&path, r#"<svg><tspan id="age_data">x</tspan></svg>"#).unwrap();

        overwrite(&path, &stats()).unwrap();
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains(r#"<tspan id="age_data">20 years"#));
    }
}
