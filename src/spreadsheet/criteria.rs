use glob::Pattern;
use glob::PatternError;
use std::collections::HashSet;

/// Criteria for selecting and reading sheets from a workbook.
#[derive(Clone, Debug)]
pub struct Criteria {
    /// Sheet name patterns; `None` loads every sheet.
    pub(crate) sheet_name_patterns: Option<Vec<Pattern>>,

    /// Sheets whose first row is data rather than a header.
    pub(crate) headerless: Vec<Pattern>,

    /// Text values read as null (default: empty string)
    pub(crate) nulls: HashSet<String>,

    /// Read error cells (`#N/A`, `#DIV/0!`) as nulls instead of failing.
    pub(crate) error_as_null: bool,

    /// Drop rows where all columns are empty.
    pub(crate) skip_empty_rows: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            sheet_name_patterns: None,
            headerless: Vec::new(),
            nulls: HashSet::from([String::new()]),
            error_as_null: true,
            skip_empty_rows: false,
        }
    }
}

impl Criteria {
    /// Restricts loading to sheets matching any of the glob patterns.
    pub fn with_sheets<I, S>(mut self, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Pattern::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.sheet_name_patterns = Some(patterns);
        Ok(self)
    }

    /// Marks sheets matching the glob patterns as having no header row.
    pub fn with_headerless<I, S>(mut self, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.headerless.push(Pattern::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Adds text literals that read as null, such as `N/A` or `-`.
    pub fn with_nulls<I, S>(mut self, nulls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nulls.extend(nulls.into_iter().map(Into::into));
        self
    }

    pub fn with_error_as_null(mut self, error_as_null: bool) -> Self {
        self.error_as_null = error_as_null;
        self
    }

    pub fn with_skip_empty_rows(mut self, skip_empty_rows: bool) -> Self {
        self.skip_empty_rows = skip_empty_rows;
        self
    }

    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        if let Some(patterns) = &self.sheet_name_patterns {
            patterns.iter().any(|pattern| pattern.matches(sheet_name))
        } else {
            true
        }
    }

    /// Checks if the first row of a sheet is its header.
    pub(crate) fn has_header(&self, sheet_name: &str) -> bool {
        !self.headerless.iter().any(|pattern| pattern.matches(sheet_name))
    }

    pub(crate) fn is_null(&self, text: &str) -> bool {
        self.nulls.contains(text)
    }
}
