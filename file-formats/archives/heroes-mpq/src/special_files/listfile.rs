//! (listfile) parsing functionality

/// Name under which archives store their file list
pub const LISTFILE_NAME: &str = "(listfile)";

/// Parse a (listfile) into individual filenames
///
/// Lines end with CR, LF or CRLF. Empty lines are ignored and names are
/// kept exactly as written, since hashing treats every character other
/// than letter case as significant.
pub fn parse_listfile(data: &[u8]) -> Vec<String> {
    let content = match std::str::from_utf8(data) {
        Ok(s) => std::borrow::Cow::Borrowed(s),
        Err(_) => {
            log::warn!("(listfile) contains invalid UTF-8, using lossy conversion");
            String::from_utf8_lossy(data)
        }
    };

    let files: Vec<String> = content
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    log::debug!("Parsed {} files from (listfile)", files.len());
    files
}
