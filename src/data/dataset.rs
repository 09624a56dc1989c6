use crate::foundation::error::{ReelError, ReelResult};

/// One labeled value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataPoint {
    pub name: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered labeled values, as parsed from user input.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dataset {
    pub entries: Vec<DataPoint>,
}

/// Totals within this distance of 100 are treated as percentages.
const PERCENT_TOLERANCE: f64 = 1.0;

impl Dataset {
    pub fn new(entries: Vec<DataPoint>) -> ReelResult<Self> {
        if entries.is_empty() {
            return Err(ReelError::data("dataset has no entries"));
        }
        for p in &entries {
            if p.name.trim().is_empty() {
                return Err(ReelError::data("dataset entry has an empty label"));
            }
            if !p.value.is_finite() || p.value < 0.0 {
                return Err(ReelError::data(format!(
                    "value of '{}' must be finite and >= 0 (got {})",
                    p.name, p.value
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Parse tabular text, falling back to free-form text.
    pub fn parse(text: &str) -> ReelResult<Self> {
        match Self::parse_table(text) {
            Ok(ds) => Ok(ds),
            Err(table_err) => Self::parse_free_text(text).map_err(|_| {
                ReelError::data(format!(
                    "input is neither a two-column table nor labeled values ({table_err})"
                ))
            }),
        }
    }

    /// Two columns separated by tab, `;` or `,`, one entry per line. A first line whose value
    /// does not parse is taken as a header.
    pub fn parse_table(text: &str) -> ReelResult<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let delimiter = ['\t', ';', ',']
            .into_iter()
            .find(|d| lines.iter().all(|l| l.contains(*d)))
            .ok_or_else(|| ReelError::data("no column delimiter shared by every line"))?;

        let mut entries = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let Some((label, value)) = line.rsplit_once(delimiter) else {
                continue;
            };
            match parse_value(value) {
                Some(v) => entries.push(DataPoint::new(unquote(label), v)),
                None if i == 0 => continue,
                None => {
                    return Err(ReelError::data(format!(
                        "line {}: '{}' is not a number",
                        i + 1,
                        value.trim()
                    )));
                }
            }
        }
        Self::new(entries)
    }

    /// Labeled values in running text, e.g. `Apples 40%, pears: 25%; other 35`.
    pub fn parse_free_text(text: &str) -> ReelResult<Self> {
        let mut entries = Vec::new();
        for segment in text.split([',', ';', '\n']) {
            let segment = segment.trim();
            let Some((label, value)) = split_trailing_number(segment) else {
                continue;
            };
            let label = label
                .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '=' | '-'))
                .trim();
            if label.is_empty() {
                continue;
            }
            entries.push(DataPoint::new(label, value));
        }
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|p| p.value).sum()
    }

    pub fn max_value(&self) -> f64 {
        self.entries.iter().map(|p| p.value).fold(0.0, f64::max)
    }

    /// Whether the values already read as shares of 100.
    pub fn is_percentage_like(&self) -> bool {
        (self.total() - 100.0).abs() <= PERCENT_TOLERANCE
    }

    /// Values rescaled so they sum to 100. An all-zero dataset is returned unchanged.
    pub fn normalized(&self) -> Dataset {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Dataset {
            entries: self
                .entries
                .iter()
                .map(|p| DataPoint::new(p.name.clone(), p.value * 100.0 / total))
                .collect(),
        }
    }
}

fn unquote(s: &str) -> String {
    s.trim().trim_matches('"').trim().to_owned()
}

fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim().trim_matches('"').trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim_end();
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split `"<label> <number>[%]"` at the start of its final number.
fn split_trailing_number(segment: &str) -> Option<(&str, f64)> {
    let body = segment.strip_suffix('%').unwrap_or(segment).trim_end();
    let start = body
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    let value = body[start..].parse::<f64>().ok()?;
    Some((&body[..start], value))
}

#[cfg(test)]
#[path = "../../tests/unit/data/dataset.rs"]
mod tests;
