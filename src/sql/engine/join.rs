use crate::sql::parser::ast::JoinClause;
use crate::sql::table::Table;
use crate::sql::types::{Row, Value};
use crate::storage::engine::Storage;

/// Nested-loop equality join of two tables
///
/// Every left row is paired with every right row whose join-column value
/// is equal; two Null keys are equal too. The join columns are resolved by
/// bare name against the left and right table respectively; the qualifiers
/// written in the ON clause are not checked, and a column resolving on
/// neither side reads as Null for every row, degenerating into a cross
/// product. Output columns are labeled `table.column`, left table first;
/// when both tables carry the same label (a self join) the right value
/// wins, like a map merge would behave.
///
/// A predicate is tested permissively against the merged row: the value
/// matches if it equals the column under the left qualifier, the right
/// qualifier, or the bare name.
pub fn nested_loop_join<S: Storage>(
    left: &Table<S>,
    right: &Table<S>,
    clause: &JoinClause,
    predicate: Option<&(String, Value)>,
) -> (Vec<String>, Vec<Row>) {
    let left_key = left
        .columns()
        .iter()
        .position(|c| c.name == clause.left.column);
    let right_key = right
        .columns()
        .iter()
        .position(|c| c.name == clause.right.column);

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| format!("{}.{}", left.name(), c.name))
        .collect();
    for column in right.columns() {
        let label = format!("{}.{}", right.name(), column.name);
        if !columns.contains(&label) {
            columns.push(label);
        }
    }

    let left_rows = left.select(None, None);
    let right_rows = right.select(None, None);

    let mut rows = Vec::new();
    for lrow in &left_rows {
        for rrow in &right_rows {
            if key_of(lrow, left_key) != key_of(rrow, right_key) {
                continue;
            }

            let mut merged: Vec<(String, Value)> = left
                .columns()
                .iter()
                .zip(lrow)
                .map(|(c, v)| (format!("{}.{}", left.name(), c.name), v.clone()))
                .collect();
            for (column, value) in right.columns().iter().zip(rrow) {
                let label = format!("{}.{}", right.name(), column.name);
                match merged.iter_mut().find(|(l, _)| l == &label) {
                    Some(entry) => entry.1 = value.clone(),
                    None => merged.push((label, value.clone())),
                }
            }

            if let Some((column, value)) = predicate {
                if !matches_merged(&merged, left.name(), right.name(), column, value) {
                    continue;
                }
            }
            rows.push(merged.into_iter().map(|(_, value)| value).collect());
        }
    }

    (columns, rows)
}

fn key_of(row: &Row, position: Option<usize>) -> &Value {
    position.map(|pos| &row[pos]).unwrap_or(&Value::Null)
}

fn matches_merged(
    merged: &[(String, Value)],
    left_name: &str,
    right_name: &str,
    column: &str,
    value: &Value,
) -> bool {
    let keys = [
        format!("{}.{}", left_name, column),
        format!("{}.{}", right_name, column),
        column.to_string(),
    ];
    keys.iter()
        .any(|key| merged.iter().any(|(label, v)| label == key && v == value))
}
