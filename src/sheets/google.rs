//! Google Sheets Reader
//! Reads tab values through the Sheets v4 `values.get` endpoint.

use super::{Cell, RawTab, SheetError, SheetSource};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn convert_value(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        Value::String(s) => Cell::from(s.as_str()),
        other => Cell::Text(other.to_string()),
    }
}

pub struct GoogleSheetsSource {
    client: Client,
    spreadsheet_id: String,
    token: String,
}

impl GoogleSheetsSource {
    pub fn new(spreadsheet_id: String, token: String) -> Result<Self, SheetError> {
        let client = Client::builder()
            .user_agent(concat!("haulbook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            spreadsheet_id,
            token,
        })
    }

    fn values_url(&self, tab: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| {
            SheetError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SheetError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "spreadsheet API base cannot hold a path",
                ))
            })?
            .pop_if_empty()
            .extend([self.spreadsheet_id.as_str(), "values", tab]);
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "FORMATTED_STRING");
        Ok(url)
    }
}

impl SheetSource for GoogleSheetsSource {
    fn describe(&self) -> String {
        format!("Google Sheet '{}'", self.spreadsheet_id)
    }

    fn read_tab(&mut self, name: &str) -> Result<RawTab, SheetError> {
        let url = self.values_url(name)?;
        let response = self.client.get(url).bearer_auth(&self.token).send()?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                return Err(SheetError::SpreadsheetNotFound(self.spreadsheet_id.clone()));
            }
            // the API answers an unknown tab with "Unable to parse range"
            StatusCode::BAD_REQUEST => return Err(SheetError::TabNotFound(name.to_string())),
            _ => {}
        }

        let body: ValueRange = response.error_for_status()?.json()?;
        let grid = body
            .values
            .iter()
            .map(|row| row.iter().map(convert_value).collect())
            .collect();

        Ok(RawTab::from_grid(name, grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tab_names_are_percent_encoded_in_path() {
        let source = GoogleSheetsSource::new("abc123".into(), "token".into()).unwrap();
        let url = source.values_url("Fuel Stops").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Fuel%20Stops?"));
    }

    #[test]
    fn json_values_map_to_cells() {
        let body: ValueRange = serde_json::from_value(json!({
            "range": "LOADS!A1:C2",
            "majorDimension": "ROWS",
            "values": [["Load Date", "Total Miles", "Is Drop and Hook"], ["3/1/2024", 412, true]]
        }))
        .unwrap();

        let row: Vec<Cell> = body.values[1].iter().map(convert_value).collect();
        assert_eq!(
            row,
            vec![
                Cell::Text("3/1/2024".into()),
                Cell::Number(412.0),
                Cell::Bool(true)
            ]
        );
    }
}
