//! Append-only table of fixed-width rows on top of the [`Pager`].
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::pager::{Page, Pager};
use crate::row::{Row, deserialize_row, serialize_row};
use crate::{PAGE_DATA_SIZE, ROW_SIZE, ROWS_PER_PAGE, TABLE_MAX_ROWS};

pub struct Table {
    pager: Pager,
    num_rows: usize,
}

impl Table {
    /// Opens the table stored at `path`. The row count is derived from the file
    /// length; a partial trailing row is ignored.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let pager = Pager::open(path)?;
        let file_length = pager.file_length();

        let trailing = file_length % ROW_SIZE as u64;
        if trailing != 0 {
            warn!(file_length, trailing, "ignoring partial trailing row");
        }
        let mut num_rows = (file_length / ROW_SIZE as u64) as usize;
        if num_rows > TABLE_MAX_ROWS {
            warn!(
                num_rows,
                max = TABLE_MAX_ROWS,
                "file holds more rows than the table can address"
            );
            num_rows = TABLE_MAX_ROWS;
        }
        debug!(num_rows, "opened table");

        Ok(Self { pager, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Resolves `row_index` to its page and the byte offset of its slot inside
    /// that page. Does not check `row_index` against the row count.
    pub fn row_slot(&mut self, row_index: usize) -> DbResult<(&mut Page, usize)> {
        let page_number = row_index / ROWS_PER_PAGE;
        let page = self.pager.get_page(page_number)?;
        let byte_offset = (row_index % ROWS_PER_PAGE) * ROW_SIZE;
        Ok((page, byte_offset))
    }

    /// Appends `row` at the end of the table.
    pub fn insert(&mut self, row: &Row) -> DbResult<()> {
        if self.num_rows >= TABLE_MAX_ROWS {
            return Err(DbError::TableFull {
                max_rows: TABLE_MAX_ROWS,
            });
        }

        let (page, offset) = self.row_slot(self.num_rows)?;
        serialize_row(row, page, offset);
        self.num_rows += 1;
        Ok(())
    }

    /// Iterates over every row in insertion order.
    pub fn select_all(&mut self) -> Rows<'_> {
        Rows {
            table: self,
            next: 0,
        }
    }

    /// Writes every resident page back to the file and syncs it.
    ///
    /// Only the bytes of rows that exist are written, so the file length stays
    /// `num_rows * ROW_SIZE`.
    pub fn flush(&mut self) -> DbResult<()> {
        let num_full_pages = self.num_rows / ROWS_PER_PAGE;
        for page_number in 0..num_full_pages {
            if self.pager.is_cached(page_number) {
                self.pager.flush(page_number, PAGE_DATA_SIZE)?;
            }
        }

        let additional_rows = self.num_rows % ROWS_PER_PAGE;
        if additional_rows > 0 && self.pager.is_cached(num_full_pages) {
            self.pager.flush(num_full_pages, additional_rows * ROW_SIZE)?;
        }

        self.pager.sync()?;
        debug!(num_rows = self.num_rows, "flushed table");
        Ok(())
    }

    /// Flushes the table and releases the file.
    pub fn close(mut self) -> DbResult<()> {
        self.flush()
    }
}

/// Lazy scan over a table's rows in insertion order.
pub struct Rows<'a> {
    table: &'a mut Table,
    next: usize,
}

impl Iterator for Rows<'_> {
    type Item = DbResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.num_rows {
            return None;
        }
        let row_index = self.next;
        self.next += 1;

        Some(
            self.table
                .row_slot(row_index)
                .map(|(page, offset)| deserialize_row(&page[..], offset)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.num_rows.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}
