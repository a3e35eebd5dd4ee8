//! Tab Frame Loader Module
//! Turns a raw spreadsheet tab into a Polars DataFrame of text columns.

use crate::sheets::RawTab;
use polars::prelude::*;

use super::NormalizeError;

/// Column carrying the 1-based spreadsheet row number of each record.
pub const SOURCE_ROW_COL: &str = "_source_row";

/// A normalized tab: one nullable string column per header, fully blank rows removed.
pub struct TabFrame {
    name: String,
    df: DataFrame,
}

impl TabFrame {
    /// Build the frame from a raw tab.
    ///
    /// Headers with no name are ignored, blank cells become null and rows whose
    /// cells are all null are dropped.
    pub fn from_raw(tab: &RawTab) -> Result<Self, NormalizeError> {
        let mut columns: Vec<Column> = Vec::with_capacity(tab.headers.len() + 1);

        // header is spreadsheet row 1
        let source_rows: Vec<u32> = (0..tab.rows.len()).map(|i| i as u32 + 2).collect();
        columns.push(Column::new(SOURCE_ROW_COL.into(), source_rows));

        let mut keep = vec![false; tab.rows.len()];

        for (col_idx, header) in tab.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            if tab.headers[..col_idx].contains(header) {
                return Err(NormalizeError::DuplicateColumn {
                    tab: tab.name.clone(),
                    column: header.clone(),
                });
            }

            let values: Vec<Option<String>> = tab
                .rows
                .iter()
                .enumerate()
                .map(|(row_idx, row)| {
                    let value = row.get(col_idx).and_then(|c| c.as_text());
                    if value.is_some() {
                        keep[row_idx] = true;
                    }
                    value
                })
                .collect();

            columns.push(Column::new(header.as_str().into(), values));
        }

        let df = DataFrame::new(columns)?;
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let df = df.filter(&mask)?;

        log::debug!(
            "Tab '{}': {} of {} rows kept after dropping blank rows",
            tab.name,
            df.height(),
            tab.rows.len()
        );

        Ok(Self {
            name: tab.name.clone(),
            df,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get list of spreadsheet column names (without the row-number column).
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|s| s != SOURCE_ROW_COL)
            .collect()
    }

    /// Fail unless every named column is present.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), NormalizeError> {
        let present = self.get_columns();
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !present.iter().any(|p| p == *c))
            .map(|c| c.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(NormalizeError::MissingColumns {
                tab: self.name.clone(),
                columns: missing,
            })
        }
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.height()
    }

    /// Spreadsheet row number of each record.
    pub fn source_rows(&self) -> Result<Vec<u32>, NormalizeError> {
        let rows = self.df.column(SOURCE_ROW_COL)?.u32()?;
        Ok(rows.into_iter().map(|v| v.unwrap_or(0)).collect())
    }

    /// Values of a text column, null where the cell was blank.
    pub fn text_column(&self, column: &str) -> Result<Vec<Option<String>>, NormalizeError> {
        let values = self.df.column(column)?.str()?;
        Ok(values
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::Cell;

    fn tab() -> RawTab {
        RawTab::from_grid(
            "EXPENSES",
            vec![
                vec![Cell::from("Trip"), Cell::from("Amount"), Cell::from("")],
                vec![Cell::from("2024-03-01 to Dallas"), Cell::Number(12.5)],
                vec![Cell::Empty, Cell::Text("  ".into()), Cell::Empty],
                vec![Cell::Empty, Cell::Number(40.0), Cell::Empty],
            ],
        )
    }

    #[test]
    fn blank_rows_are_dropped_and_row_numbers_kept() {
        let frame = TabFrame::from_raw(&tab()).unwrap();
        assert_eq!(frame.get_row_count(), 2);
        assert_eq!(frame.source_rows().unwrap(), vec![2, 4]);
        assert_eq!(
            frame.text_column("Trip").unwrap(),
            vec![Some("2024-03-01 to Dallas".to_string()), None]
        );
        assert_eq!(
            frame.text_column("Amount").unwrap(),
            vec![Some("12.5".to_string()), Some("40".to_string())]
        );
    }

    #[test]
    fn unnamed_columns_are_ignored() {
        let frame = TabFrame::from_raw(&tab()).unwrap();
        assert_eq!(frame.get_columns(), vec!["Trip", "Amount"]);
    }

    #[test]
    fn missing_columns_are_listed() {
        let frame = TabFrame::from_raw(&tab()).unwrap();
        let err = frame
            .require_columns(&["Trip", "Category", "Expense Date"])
            .unwrap_err();
        match err {
            NormalizeError::MissingColumns { tab, columns } => {
                assert_eq!(tab, "EXPENSES");
                assert_eq!(columns, vec!["Category", "Expense Date"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
