use std::collections::HashMap;

/// Strip one pair of surrounding double quotes, if present.
pub fn clean_up_string(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

/// Parsed `#EXTINF` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtInf {
    pub duration: Option<f64>,
    pub attributes: HashMap<String, String>,
    pub title: Option<String>,
}

impl ExtInf {
    /// Parse from `#EXTINF:<duration> key="value" ...,<title>`.
    pub fn parse(line: &str) -> Self {
        let content = match line.trim().strip_prefix("#EXTINF:") {
            Some(c) => c,
            None => return Self::default(),
        };

        let (header, title) = match split_outside_quotes(content, ',') {
            Some((header, title)) => (header, Some(title.trim())),
            None => (content, None),
        };

        let header = header.trim();
        let (duration, attrs) = match header.split_once(char::is_whitespace) {
            Some((d, rest)) => (d, rest),
            None => (header, ""),
        };

        Self {
            duration: duration.parse().ok(),
            attributes: parse_attributes(attrs),
            title: title.filter(|t| !t.is_empty()).map(String::from),
        }
    }
}

/// Parse space separated `key="value"` pairs. Keys are lower-cased.
pub fn parse_attributes(s: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut start = 0;
    let mut in_quotes = false;

    let mut push = |token: &str| {
        if let Some((key, value)) = token.split_once('=') {
            let key = key.trim().to_lowercase();
            if !key.is_empty() {
                attrs.insert(key, clean_up_string(value.trim()).to_string());
            }
        }
    };

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if start < s.len() {
        push(&s[start..]);
    }

    attrs
}

fn split_outside_quotes(s: &str, sep: char) -> Option<(&str, &str)> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => return Some((&s[..i], &s[i + c.len_utf8()..])),
            _ => {}
        }
    }
    None
}
