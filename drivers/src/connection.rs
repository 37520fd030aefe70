use polydb_core::{Result, Row, Value};
use polydb_types::DialectKind;

/// Named parameter: name without the dialect prefix, and its native value
pub type Param<'a> = (&'a str, Value);

/// Synchronous connection to one engine
///
/// SQL uses the dialect's named-parameter prefix (`@name` or `:name`);
/// adapters rewrite it to whatever their driver expects. Parameters the
/// statement does not mention are ignored.
///
/// A connection is owned by one unit of work at a time; it is never shared
/// across concurrent operations.
pub trait Connection {
    /// Dialect of the engine behind this connection
    fn dialect(&self) -> DialectKind;

    /// Execute a statement and return the affected row count
    fn execute(&mut self, sql: &str, params: &[Param<'_>]) -> Result<u64>;

    /// Execute a query and collect every row
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>>;

    /// First column of the first row, `Null` when there are no rows
    fn scalar(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Value> {
        Ok(self
            .query(sql, params)?
            .into_iter()
            .next()
            .and_then(|row| row.iter().next().map(|(_, value)| value.clone()))
            .unwrap_or(Value::Null))
    }

    /// Execute parameterless statements as one batch
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Run `f` inside a transaction, rolling back when it fails
    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                // the original error wins over a failed rollback
                let _ = self.rollback();
                Err(err)
            }
        }
    }
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn dialect(&self) -> DialectKind {
        (**self).dialect()
    }

    fn execute(&mut self, sql: &str, params: &[Param<'_>]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn scalar(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Value> {
        (**self).scalar(sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        (**self).execute_batch(sql)
    }

    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }
}
