//! Request parsing for the API and the HTML interface.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{DATE_FORMAT, DATE_FORMAT_INVALID, FieldMap};

/// Query parameters accepted by the employee listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFilter {
    /// Earliest date of birth, inclusive.
    #[serde(default)]
    pub from_date: Option<String>,
    /// Latest date of birth, inclusive.
    #[serde(default)]
    pub to_date: Option<String>,
}

impl EmployeeFilter {
    /// Returns the date-of-birth range to filter by.
    ///
    /// The filter only applies when both bounds are given and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidValue`] if a bound is not `YYYY-MM-DD`.
    pub fn range(&self) -> AppResult<Option<(NaiveDate, NaiveDate)>> {
        let (Some(from), Some(to)) = (non_empty(&self.from_date), non_empty(&self.to_date)) else {
            return Ok(None);
        };
        Ok(Some((parse_date(from)?, parse_date(to)?)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}

fn parse_date(text: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| AppError::invalid_value(DATE_FORMAT_INVALID))
}

/// Decodes a request body as a JSON object, whatever its content type.
///
/// Returns `None` for anything that is not a JSON object.
pub fn parse_json_body(body: &[u8]) -> Option<FieldMap> {
    serde_json::from_slice(body)
        .ok()
        .and_then(FieldMap::from_json)
}
