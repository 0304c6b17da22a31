//! Line identifier list parsing.

use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Splits the contents of a line identifier file into identifiers.
///
/// Quote characters are removed everywhere, entries are newline separated
/// and the trailing blank entry left by the final newline is dropped. Order
/// and duplicates are kept as they appear in the file.
///
/// # Errors
///
/// Returns [`Error::InvalidLineId`] for an empty entry anywhere but the end,
/// or for an entry that cannot be used as a file name or URL path segment.
pub fn parse_line_ids(text: &str) -> Result<Vec<String>> {
    let unquoted = text.replace('"', "");
    let mut entries: Vec<&str> = unquoted
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();

    if entries.last().is_some_and(|l| l.trim().is_empty()) {
        entries.pop();
    }

    entries
        .into_iter()
        .map(|entry| {
            let id = entry.trim();
            if is_path_safe(id) {
                Ok(id.to_string())
            } else {
                Err(Error::InvalidLineId(entry.to_string()))
            }
        })
        .collect()
}

/// Reads and parses a line identifier file.
pub fn read_line_ids(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let ids = parse_line_ids(&text)?;
    debug!(path = %path.display(), count = ids.len(), "Line identifiers loaded");
    Ok(ids)
}

/// Line ids become both a file name and one segment of a request path, so
/// separators, URL delimiters and percent escapes are refused.
fn is_path_safe(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0', '?', '#', '%'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_quotes_and_trailing_blank() {
        let ids = parse_line_ids("\"bakerloo\"\n\"central\"\n\"district\"\n").unwrap();
        assert_eq!(ids, vec!["bakerloo", "central", "district"]);
    }

    #[test]
    fn test_parse_unquoted_without_trailing_newline() {
        let ids = parse_line_ids("victoria\njubilee").unwrap();
        assert_eq!(ids, vec!["victoria", "jubilee"]);
    }

    #[test]
    fn test_parse_crlf() {
        let ids = parse_line_ids("\"dlr\"\r\n\"elizabeth\"\r\n").unwrap();
        assert_eq!(ids, vec!["dlr", "elizabeth"]);
    }

    #[test]
    fn test_parse_keeps_duplicates_in_order() {
        let ids = parse_line_ids("central\nbakerloo\ncentral\n").unwrap();
        assert_eq!(ids, vec!["central", "bakerloo", "central"]);
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_line_ids("").unwrap().is_empty());
        // a lone newline is one blank identifier, not an empty list
        assert!(parse_line_ids("\n").is_err());
    }

    #[test]
    fn test_parse_rejects_interior_blank() {
        let err = parse_line_ids("central\n\nbakerloo\n").unwrap_err();
        assert!(matches!(err, Error::InvalidLineId(_)));
    }

    #[test]
    fn test_parse_rejects_path_traversal() {
        assert!(parse_line_ids("../etc\n").is_err());
        assert!(parse_line_ids("a/b\n").is_err());
        assert!(parse_line_ids("..\n").is_err());
    }

    #[test]
    fn test_parse_rejects_url_delimiters() {
        for bad in ["a?b\n", "a#b\n", "a%2Fb\n"] {
            let err = parse_line_ids(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidLineId(_)), "{bad:?} accepted");
        }
        assert_eq!(parse_line_ids("hammersmith-city\n").unwrap(), vec!["hammersmith-city"]);
    }

    #[test]
    fn test_read_line_ids_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_ids.txt");
        std::fs::write(&path, "\"northern\"\n\"piccadilly\"\n").unwrap();

        assert_eq!(read_line_ids(&path).unwrap(), vec!["northern", "piccadilly"]);
    }
}
