//! Evaluation of key equality filters for the in-memory store.
//!
//! Only the subset the store layer produces is understood:
//! `PartitionKey eq '<v>'`, `RowKey eq '<v>'`, joined with ` and `, with
//! single quotes inside values doubled.

/// A parsed key filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyFilter {
    pub(crate) partition_key: Option<String>,
    pub(crate) row_key: Option<String>,
}

impl KeyFilter {
    pub(crate) fn matches(&self, partition_key: &str, row_key: &str) -> bool {
        self.partition_key.as_deref().map_or(true, |pk| pk == partition_key)
            && self.row_key.as_deref().map_or(true, |rk| rk == row_key)
    }
}

/// Parses a filter string.
pub(crate) fn parse_filter(input: &str) -> Result<KeyFilter, String> {
    let mut filter = KeyFilter::default();
    let mut rest = input.trim();

    loop {
        let (is_partition, after_field) = if let Some(r) = rest.strip_prefix("PartitionKey") {
            (true, r)
        } else if let Some(r) = rest.strip_prefix("RowKey") {
            (false, r)
        } else {
            return Err(format!("unsupported filter clause: {rest}"));
        };

        let quoted = after_field
            .strip_prefix(" eq '")
            .ok_or_else(|| format!("expected \" eq '\" in filter: {input}"))?;
        let (value, consumed) = read_quoted(quoted)?;

        let slot = if is_partition {
            &mut filter.partition_key
        } else {
            &mut filter.row_key
        };
        if slot.is_some() {
            return Err(format!("duplicate key clause in filter: {input}"));
        }
        *slot = Some(value);

        rest = &quoted[consumed..];
        if rest.is_empty() {
            return Ok(filter);
        }
        rest = rest
            .strip_prefix(" and ")
            .ok_or_else(|| format!("expected \" and \" in filter: {input}"))?;
    }
}

/// Reads a quoted value whose opening quote was already consumed.
///
/// Returns the unescaped value and the number of bytes consumed, including
/// the closing quote.
fn read_quoted(input: &str) -> Result<(String, usize), String> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if c != '\'' {
            value.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '\''))) {
            value.push('\'');
            chars.next();
        } else {
            return Ok((value, index + 1));
        }
    }

    Err("unterminated string literal in filter".to_string())
}
