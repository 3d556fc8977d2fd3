use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::Value;

/// Keys-only equality query over one table. Conditions are ANDed; a filter
/// with no conditions matches every row.
#[derive(Debug, Default)]
pub struct Filter {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value` when `value` is set. Empty strings count as unset.
    pub fn eq<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            let value = value.into();
            if matches!(&value, Value::Text(s) if s.is_empty()) {
                return self;
            }
            self.columns.push(column);
            self.values.push(value);
        }
        self
    }

    /// Returns matching ids in ascending order.
    pub fn ids(&self, conn: &Connection, table: &str) -> Result<Vec<i64>> {
        let mut sql = format!("SELECT id FROM {}", table);
        if !self.columns.is_empty() {
            let clauses: Vec<String> = self
                .columns
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{} = ?{}", column, i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(rusqlite::params_from_iter(self.values.iter()), |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        Ok(ids)
    }
}
