//! The Pager owns the database file and caches its pages in memory.
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::{PAGE_DATA_SIZE, PAGE_SIZE, TABLE_MAX_PAGES};

pub type Page = [u8; PAGE_SIZE];

/// Page cache over a single file.
///
/// Page `n` holds the file bytes `[n * PAGE_DATA_SIZE, (n + 1) * PAGE_DATA_SIZE)`
/// in the front of its buffer, so the file itself is nothing but back-to-back
/// rows. Pages are loaded on first access and stay resident until the pager is
/// dropped.
pub struct Pager {
    file: File,
    file_length: u64,
    pages: Vec<Option<Box<Page>>>,
}

impl Pager {
    /// Opens the database file for read/write, creating it if it doesn't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.metadata()?.len();
        debug!(path = %path.display(), file_length, "opened pager");

        Ok(Self {
            file,
            file_length,
            pages: Vec::new(),
        })
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn is_cached(&self, page_number: usize) -> bool {
        matches!(self.pages.get(page_number), Some(Some(_)))
    }

    /// Number of pages currently resident in memory.
    pub fn num_cached_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    /// Number of whole or partial pages present in the file.
    fn pages_on_disk(&self) -> u64 {
        self.file_length.div_ceil(PAGE_DATA_SIZE as u64)
    }

    /// Returns the buffer for `page_number`, reading it from disk on a cache miss.
    ///
    /// Once loaded, every later call returns the same buffer.
    pub fn get_page(&mut self, page_number: usize) -> DbResult<&mut Page> {
        if page_number >= TABLE_MAX_PAGES {
            return Err(DbError::PageOutOfRange {
                page_number,
                max: TABLE_MAX_PAGES,
            });
        }
        if page_number >= self.pages.len() {
            self.pages.resize_with(page_number + 1, || None);
        }

        let on_disk = (page_number as u64) < self.pages_on_disk();
        let slot = &mut self.pages[page_number];
        let page = match slot.take() {
            Some(page) => page,
            None => {
                let mut page = Box::new([0u8; PAGE_SIZE]);
                if on_disk {
                    let read = read_page(&mut self.file, page_number, &mut page)?;
                    debug!(page_number, bytes_read = read, "cache miss, loaded page");
                } else {
                    debug!(page_number, "cache miss, new page");
                }
                page
            }
        };
        Ok(&mut **slot.insert(page))
    }

    /// Writes the first `len` bytes of a resident page back to the file.
    ///
    /// `len` is capped at `PAGE_DATA_SIZE`; the unused tail of a page is never
    /// written.
    pub fn flush(&mut self, page_number: usize, len: usize) -> DbResult<()> {
        let page = self
            .pages
            .get(page_number)
            .and_then(|p| p.as_deref())
            .ok_or(DbError::PageNotLoaded(page_number))?;
        let len = len.min(PAGE_DATA_SIZE);
        let offset = page_offset(page_number);

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&page[..len])?;
        self.file_length = self.file_length.max(offset + len as u64);
        debug!(page_number, len, "flushed page");
        Ok(())
    }

    /// Asks the OS to persist everything written so far.
    pub fn sync(&mut self) -> DbResult<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[inline]
fn page_offset(page_number: usize) -> u64 {
    page_number as u64 * PAGE_DATA_SIZE as u64
}

/// Fills the data area of `page` from the file. A short read at the end of the
/// file leaves the rest of the buffer zeroed.
fn read_page(file: &mut File, page_number: usize, page: &mut Page) -> DbResult<usize> {
    file.seek(SeekFrom::Start(page_offset(page_number)))?;

    let buf = &mut page[..PAGE_DATA_SIZE];
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
