//! Tag parser
//!
//! Splits a client line into tag, command name and argument string.

/// Outcome of parsing one client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<'a> {
    /// The line has no separator, so no tag can be located
    Untagged,

    /// A tag was located but failed validation; its content must not be echoed
    InvalidTag,

    /// A well-formed tagged command
    Command {
        /// Client tag, echoed verbatim on the response line
        tag: &'a str,

        /// Command name, lowercased
        name: String,

        /// Everything after the command name and its separator
        args: &'a str,

        /// Raw text after the tag, command name included
        rest: &'a str,
    },
}

impl Parsed<'_> {
    /// The line handed to the router: everything after the tag, with only
    /// the command name lowercased.
    ///
    /// Returns `None` for lines that never reach the router.
    pub fn routed_line(&self) -> Option<String> {
        match self {
            Parsed::Command { name, rest, .. } => {
                let name_len = rest.find(' ').unwrap_or(rest.len());
                let mut routed = String::with_capacity(name.len() + rest.len() - name_len);
                routed.push_str(name);
                routed.push_str(&rest[name_len..]);
                Some(routed)
            }
            _ => None,
        }
    }
}

/// Parse one line (terminator already stripped)
///
/// The tag ends at the first space; the command name ends at the next one.
pub fn parse_line(line: &str) -> Parsed<'_> {
    let Some((tag, rest)) = line.split_once(' ') else {
        return Parsed::Untagged;
    };

    if !is_valid_tag(tag) {
        return Parsed::InvalidTag;
    }

    let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));

    Parsed::Command {
        tag,
        name: name.to_lowercase(),
        args,
        rest,
    }
}

/// A tag is valid when it is non-empty and purely ASCII alphanumeric
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_alphanumeric())
}
