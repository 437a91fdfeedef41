use std::collections::HashMap;

use postgres::types::Type;
use postgres::{Client, Statement};

use super::Session;
use crate::command::Command;
use crate::error::SessionError;
use crate::key::NormalizedKey;

impl From<postgres::Error> for SessionError {
    fn from(err: postgres::Error) -> Self {
        SessionError::with_source(err.to_string(), err)
    }
}

/// Prepared statements for the lock commands run through one cursor.
///
/// Dropping a `Statement` deallocates it on the server, so closing the
/// cursor cleans up everything it prepared.
#[derive(Default)]
pub struct PgCursor {
    statements: HashMap<String, Statement>,
}

impl PgCursor {
    fn prepare(&mut self, client: &mut Client, sql: String) -> Result<Statement, SessionError> {
        if let Some(statement) = self.statements.get(&sql) {
            return Ok(statement.clone());
        }
        let statement = client.prepare(&sql)?;
        self.statements.insert(sql, statement.clone());
        Ok(statement)
    }
}

/// Runs advisory lock commands on a synchronous `postgres` client, binding
/// the key as `bigint` or as two `int` parameters.
impl Session for Client {
    type Cursor = PgCursor;

    fn cursor(&mut self) -> Result<PgCursor, SessionError> {
        if self.is_closed() {
            return Err(SessionError::new("connection is closed"));
        }
        Ok(PgCursor::default())
    }

    fn execute(
        &mut self,
        cursor: &mut PgCursor,
        command: &Command,
    ) -> Result<Option<bool>, SessionError> {
        let statement = cursor.prepare(self, command.sql())?;
        let row = match command.key() {
            NormalizedKey::Single(id) => self.query_one(&statement, &[&id])?,
            NormalizedKey::Pair(a, b) => self.query_one(&statement, &[&a, &b])?,
        };
        match row.columns().first() {
            Some(column) if *column.type_() == Type::BOOL => Ok(Some(row.try_get(0)?)),
            _ => Ok(None),
        }
    }

    fn close_cursor(&mut self, cursor: PgCursor) -> Result<(), SessionError> {
        drop(cursor);
        Ok(())
    }
}
