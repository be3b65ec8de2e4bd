//! Pure wide-to-long reshaping for column-oriented provider payloads.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReshapeError {
    #[error("matrix has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },

    #[error("matrix row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Turns a column-oriented `label -> cells` mapping into one row per label,
/// with the key promoted into the row.
///
/// Rows come out sorted by label, so the result is deterministic regardless
/// of the provider's map ordering.
pub fn pivot_rows<C, R, F>(columns: impl IntoIterator<Item = (String, C)>, mut row: F) -> Vec<R>
where
    F: FnMut(String, C) -> R,
{
    let mut entries: Vec<(String, C)> = columns.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(label, cells)| row(label, cells))
        .collect()
}

/// Emits one record per (row, column) pair of a 2-D cell matrix indexed by
/// two parallel axes, in row-major order.
///
/// The matrix must be exactly `rows.len()` by `cols.len()`; any mismatch is
/// an error rather than a truncated result.
pub fn cross_rows<A, B, M, R, F>(
    rows: &[A],
    cols: &[B],
    cells: &[Vec<M>],
    mut emit: F,
) -> Result<Vec<R>, ReshapeError>
where
    F: FnMut(&A, &B, &M) -> R,
{
    if cells.len() != rows.len() {
        return Err(ReshapeError::RowCount {
            expected: rows.len(),
            found: cells.len(),
        });
    }

    for (index, row) in cells.iter().enumerate() {
        if row.len() != cols.len() {
            return Err(ReshapeError::RowWidth {
                row: index,
                expected: cols.len(),
                found: row.len(),
            });
        }
    }

    let mut records = Vec::with_capacity(rows.len() * cols.len());
    for (row_label, row) in rows.iter().zip(cells) {
        for (col_label, cell) in cols.iter().zip(row) {
            records.push(emit(row_label, col_label, cell));
        }
    }

    Ok(records)
}
