//! YAML frontmatter splitting for command modules
//!
//! A module file may open with a `---` delimited YAML block holding the
//! command metadata. Everything after the closing delimiter is the body.

/// A module file split into its metadata block and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// Raw YAML between the delimiters, `None` when absent or blank.
    pub yaml: Option<&'a str>,
    /// Content following the closing delimiter.
    pub body: &'a str,
}

/// Split `content` into frontmatter and body.
///
/// # Format
/// ```markdown
/// ---
/// description: Build the project
/// ---
/// Building {{ options.target }}
/// ```
///
/// Content without an opening delimiter, or with an opening delimiter that
/// is never closed, is returned whole as the body.
pub fn split(content: &str) -> Frontmatter<'_> {
    let content = content.trim_start_matches('\u{feff}');
    let whole = Frontmatter {
        yaml: None,
        body: content,
    };

    let Some(after_open) = content.strip_prefix("---") else {
        return whole;
    };
    let Some(rest) = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
    else {
        return whole;
    };

    match find_closing_delimiter(rest) {
        Some((yaml_end, body_start)) => {
            let yaml = &rest[..yaml_end];
            Frontmatter {
                yaml: (!yaml.trim().is_empty()).then_some(yaml),
                body: &rest[body_start..],
            }
        }
        None => whole,
    }
}

/// Byte offsets of the closing `---` line: where the YAML ends and where
/// the body begins.
fn find_closing_delimiter(rest: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}
