//! The `db > ` prompt loop driving a [`Table`].
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{DbError, DbResult};
use crate::statement::{MetaCommand, execute_statement, prepare_statement};
use crate::table::Table;

struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Reads the next line. Returns `false` at end of input.
    fn read_input<R: BufRead>(&mut self, reader: &mut R) -> DbResult<bool> {
        self.buffer.clear();
        let bytes_read = reader.read_line(&mut self.buffer)?;
        self.buffer = self.buffer.trim().to_string();
        Ok(bytes_read > 0)
    }
}

fn print_prompt<W: Write>(out: &mut W) -> DbResult<()> {
    write!(out, "db > ")?;
    out.flush()?;
    Ok(())
}

/// Opens the table at `path` and serves commands from `input` until `.exit` or
/// end of input.
///
/// The table is closed on every path out of the loop, so rows reported as
/// `Executed.` reach the file even when writing to `out` fails. The first
/// error is returned.
pub fn run<P, R, W>(path: P, input: &mut R, out: &mut W) -> DbResult<()>
where
    P: AsRef<Path>,
    R: BufRead,
    W: Write,
{
    let mut table = Table::open(path)?;
    let session = serve(&mut table, input, out);
    let closed = table.close();

    if let (Err(_), Err(close_err)) = (&session, &closed) {
        warn!(error = %close_err, "failed to flush table after session error");
    }
    session.and(closed)
}

fn serve<R: BufRead, W: Write>(table: &mut Table, input: &mut R, out: &mut W) -> DbResult<()> {
    let mut input_buffer = InputBuffer::new();

    loop {
        print_prompt(out)?;
        if !input_buffer.read_input(input)? {
            break;
        }
        let line = input_buffer.buffer.as_str();

        match MetaCommand::parse(line) {
            Some(MetaCommand::Exit) => break,
            Some(MetaCommand::Unrecognized) => {
                writeln!(out, "Unrecognized meta-command: {line}")?;
                continue;
            }
            None => {}
        }

        let statement = match prepare_statement(line) {
            Ok(statement) => statement,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };

        match execute_statement(&statement, table, out) {
            Ok(()) => writeln!(out, "Executed.")?,
            Err(DbError::TableFull { .. }) => writeln!(out, "Error: Table full.")?,
            Err(err) => return Err(err),
        }
    }

    out.flush()?;
    Ok(())
}
