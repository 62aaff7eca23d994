//! Message personalisation.

use std::borrow::Cow;

use action_locator::DEFAULT_SUBJECT_NAME;

/// First and remaining name tokens; `("there", "")` for a blank name.
pub fn split_name(full_name: &str) -> (String, String) {
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next().unwrap_or(DEFAULT_SUBJECT_NAME).to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Substitute `{firstName}`, `{lastName}` and `{fullName}` case-insensitively.
pub fn personalize(template: &str, full_name: &str) -> String {
    let full_name = match full_name.trim() {
        "" => DEFAULT_SUBJECT_NAME,
        trimmed => trimmed,
    };
    let (first, last) = split_name(full_name);
    let message = replace_placeholder(template, "{firstname}", &first);
    let message = replace_placeholder(&message, "{lastname}", &last);
    replace_placeholder(&message, "{fullname}", full_name).into_owned()
}

/// Replace every ASCII-case-insensitive occurrence of `needle` (lowercase).
fn replace_placeholder<'a>(haystack: &'a str, needle: &str, value: &str) -> Cow<'a, str> {
    let lowered = haystack.to_ascii_lowercase();
    if !lowered.contains(needle) {
        return Cow::Borrowed(haystack);
    }
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    for (start, _) in lowered.match_indices(needle) {
        out.push_str(&haystack[cursor..start]);
        out.push_str(value);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    Cow::Owned(out)
}
