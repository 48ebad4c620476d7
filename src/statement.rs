use std::io::Write;

use crate::error::{DbError, PrepareError};
use crate::row::Row;
use crate::table::Table;

// Non-SQL statements like .exit are called “meta-commands”.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Unrecognized,
}

impl MetaCommand {
    pub fn parse(input: &str) -> Option<MetaCommand> {
        match input {
            ".exit" => Some(MetaCommand::Exit),
            _ if input.starts_with('.') => Some(MetaCommand::Unrecognized),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// Parses `insert <id> <username> <email>` or `select`.
pub fn prepare_statement(input: &str) -> Result<Statement, PrepareError> {
    let mut tokens = input.split_whitespace();
    match tokens.next() {
        Some("insert") => prepare_insert(tokens),
        Some("select") => Ok(Statement::Select),
        _ => Err(PrepareError::Unrecognized(input.to_string())),
    }
}

fn prepare_insert<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<Statement, PrepareError> {
    let (Some(id), Some(username), Some(email)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::SyntaxError);
    };

    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| PrepareError::SyntaxError)?;

    Ok(Statement::Insert(Row::new(id, username, email)?))
}

/// Runs `statement` against `table`, printing selected rows to `out`.
pub fn execute_statement<W: Write>(
    statement: &Statement,
    table: &mut Table,
    out: &mut W,
) -> Result<(), DbError> {
    match statement {
        Statement::Insert(row) => table.insert(row),
        Statement::Select => {
            for row in table.select_all() {
                writeln!(out, "{}", row?)?;
            }
            Ok(())
        }
    }
}
