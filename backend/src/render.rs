use banksight_core::db::ResultSet;
use serde::Serialize;

use crate::error::CommandError;

pub struct Output {
    pub json: bool,
}

impl Output {
    pub fn value<T, F>(&self, value: &T, text: F) -> Result<(), CommandError>
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    pub fn rows(&self, rows: &ResultSet) -> Result<(), CommandError> {
        self.value(rows, || table_text(rows))
    }
}

fn line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

/// Left-aligned columns separated by two spaces, one row per line.
pub fn table_text(rows: &ResultSet) -> String {
    let cells: Vec<Vec<String>> = rows
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = rows.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = Vec::with_capacity(cells.len() + 3);
    out.push(line(rows.columns.iter().map(String::as_str), &widths));
    out.push(line(rules.iter().map(String::as_str), &widths));
    for row in &cells {
        out.push(line(row.iter().map(String::as_str), &widths));
    }
    out.push(format!("({} rows)", cells.len()));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use banksight_core::db::Cell;

    #[test]
    fn test_table_text() {
        let rows = ResultSet {
            columns: vec!["txn_id".into(), "amount".into()],
            rows: vec![
                vec![Cell::Text("T1".into()), Cell::Real(250.5)],
                vec![Cell::Text("T22".into()), Cell::Null],
            ],
        };
        assert_eq!(
            table_text(&rows),
            "txn_id  amount\n------  ------\nT1      250.5\nT22\n(2 rows)"
        );
    }
}
