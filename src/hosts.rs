//! Host pattern expansion.
//!
//! A host identifier may carry a bracketed range such as `web[01:10].lab`,
//! `db[a:c]` or `edge[0:20:5]`. Several ranges in one identifier multiply.
//! Malformed ranges are errors rather than literal host names.

use crate::error::{InventoryError, Result};

const ASCII_LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn detect_range(pattern: &str) -> bool {
    pattern.contains('[')
}

/// Expands `pattern` into concrete host names in ascending order.
pub fn expand_hostname_range(pattern: &str) -> Result<Vec<String>> {
    let Some(open) = pattern.find('[') else {
        return Ok(vec![pattern.to_string()]);
    };
    let close = pattern[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(|| InventoryError::range(pattern, "missing closing ']'"))?;
    let head = &pattern[..open];
    let body = &pattern[open + 1..close];
    let tail = &pattern[close + 1..];

    let bounds = RangeBounds::parse(pattern, body)?;
    let mut hosts = Vec::new();
    for segment in bounds.segments(pattern)? {
        let name = format!("{head}{segment}{tail}");
        if detect_range(&name) {
            hosts.extend(expand_hostname_range(&name)?);
        } else {
            hosts.push(name);
        }
    }
    Ok(hosts)
}

#[derive(Debug)]
struct RangeBounds<'a> {
    begin: &'a str,
    end: &'a str,
    step: usize,
}

impl<'a> RangeBounds<'a> {
    fn parse(pattern: &str, body: &'a str) -> Result<Self> {
        let parts = body.split(':').collect::<Vec<_>>();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(InventoryError::range(
                pattern,
                "range must be begin:end or begin:end:step",
            ));
        }
        let begin = if parts[0].is_empty() { "0" } else { parts[0] };
        let end = parts[1];
        if end.is_empty() {
            return Err(InventoryError::range(pattern, "range must specify an end value"));
        }
        let step = match parts.get(2) {
            None => 1,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|step| *step > 0)
                .ok_or_else(|| {
                    InventoryError::range(pattern, format!("step '{raw}' must be a positive integer"))
                })?,
        };
        Ok(RangeBounds { begin, end, step })
    }

    fn segments(&self, pattern: &str) -> Result<Vec<String>> {
        if let (Some(begin), Some(end)) = (letter_index(self.begin), letter_index(self.end)) {
            if begin > end {
                return Err(InventoryError::range(pattern, "range must have begin <= end"));
            }
            return Ok(ASCII_LETTERS[begin..=end]
                .chars()
                .step_by(self.step)
                .map(String::from)
                .collect());
        }

        let begin = parse_bound(pattern, self.begin)?;
        let end = parse_bound(pattern, self.end)?;
        if begin > end {
            return Err(InventoryError::range(pattern, "range must have begin <= end"));
        }
        let width = if self.begin.len() > 1 && self.begin.starts_with('0') {
            if self.begin.len() != self.end.len() {
                return Err(InventoryError::range(
                    pattern,
                    "zero-padded ranges must use equal-width begin and end",
                ));
            }
            self.begin.len()
        } else {
            0
        };
        Ok((begin..=end)
            .step_by(self.step)
            .map(|n| format!("{n:0width$}"))
            .collect())
    }
}

fn letter_index(bound: &str) -> Option<usize> {
    let mut chars = bound.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_alphabetic() => ASCII_LETTERS.find(ch),
        _ => None,
    }
}

fn parse_bound(pattern: &str, bound: &str) -> Result<u64> {
    if !bound.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InventoryError::range(
            pattern,
            format!("bound '{bound}' is neither a number nor a single letter"),
        ));
    }
    bound
        .parse()
        .map_err(|_| InventoryError::range(pattern, format!("bound '{bound}' is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(expand_hostname_range("nxos101").unwrap(), vec!["nxos101"]);
        assert_eq!(
            expand_hostname_range("host:8080").unwrap(),
            vec!["host:8080"]
        );
    }

    #[test]
    fn numeric_range_expands_inclusively() {
        assert_eq!(
            expand_hostname_range("vyos101[1:4]").unwrap(),
            vec!["vyos1011", "vyos1012", "vyos1013", "vyos1014"]
        );
    }

    #[test]
    fn zero_padding_follows_bound_width() {
        assert_eq!(
            expand_hostname_range("web[08:11].lab").unwrap(),
            vec!["web08.lab", "web09.lab", "web10.lab", "web11.lab"]
        );
        assert_eq!(
            expand_hostname_range("r[001:003]").unwrap(),
            vec!["r001", "r002", "r003"]
        );
        // An unpadded begin does not pad, whatever the end looks like.
        assert_eq!(
            expand_hostname_range("10[1:04]").unwrap(),
            vec!["101", "102", "103", "104"]
        );
    }

    #[test]
    fn padded_bounds_must_share_width() {
        let err = expand_hostname_range("r[01:100]").unwrap_err();
        assert!(matches!(err, InventoryError::RangeSyntax { .. }));
    }

    #[test]
    fn step_and_empty_begin() {
        assert_eq!(
            expand_hostname_range("edge[0:20:10]").unwrap(),
            vec!["edge0", "edge10", "edge20"]
        );
        assert_eq!(expand_hostname_range("h[:2]").unwrap(), vec!["h0", "h1", "h2"]);
    }

    #[test]
    fn alphabetic_ranges() {
        assert_eq!(
            expand_hostname_range("db-[a:c]").unwrap(),
            vec!["db-a", "db-b", "db-c"]
        );
        assert_eq!(expand_hostname_range("x[y:B]").unwrap(), vec!["xy", "xz", "xA", "xB"]);
    }

    #[test]
    fn multiple_ranges_multiply() {
        assert_eq!(
            expand_hostname_range("rack[1:2]-node[a:b]").unwrap(),
            vec!["rack1-nodea", "rack1-nodeb", "rack2-nodea", "rack2-nodeb"]
        );
    }

    #[test]
    fn malformed_ranges_are_fatal() {
        for pattern in [
            "sw[1:4",
            "sw[1]",
            "sw[1:2:3:4]",
            "sw[1:]",
            "sw[4:1]",
            "sw[a:1]",
            "sw[1:x2]",
            "sw[1:4:0]",
            "sw[c:a]",
        ] {
            let err = expand_hostname_range(pattern).unwrap_err();
            assert!(
                matches!(err, InventoryError::RangeSyntax { .. }),
                "{pattern} should fail"
            );
        }
    }
}
