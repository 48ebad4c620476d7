use std::fs;

use rowstore::{
    DbError, PAGE_DATA_SIZE, PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE, Row, TABLE_MAX_PAGES,
    TABLE_MAX_ROWS, Table, deserialize_row,
};
use tempfile::tempdir;

fn user(id: u32) -> Row {
    Row::new(id, &format!("user{id}"), &format!("person{id}@example.com")).unwrap()
}

fn select_all(table: &mut Table) -> Vec<Row> {
    table.select_all().collect::<Result<Vec<_>, _>>().unwrap()
}

#[test]
fn test_constants() {
    assert_eq!(ROW_SIZE, 293);
    assert_eq!(ROWS_PER_PAGE, 13);
    assert_eq!(TABLE_MAX_ROWS, 1300);
}

#[test]
fn test_new_table_is_empty() {
    let temp_dir = tempdir().unwrap();
    let mut table = Table::open(temp_dir.path().join("test.db")).unwrap();

    assert_eq!(table.num_rows(), 0);
    assert_eq!(table.select_all().count(), 0);
}

#[test]
fn test_row_slot_address() {
    let temp_dir = tempdir().unwrap();
    let mut table = Table::open(temp_dir.path().join("test.db")).unwrap();

    let (page_1, offset) = table.row_slot(13).unwrap();
    let page_1 = page_1.as_ptr();
    assert_eq!(offset, 0);
    assert_eq!(table.pager().num_cached_pages(), 1);

    let (page, offset) = table.row_slot(14).unwrap();
    assert_eq!(page.as_ptr(), page_1);
    assert_eq!(offset, ROW_SIZE);

    let (page, offset) = table.row_slot(12).unwrap();
    assert_ne!(page.as_ptr(), page_1);
    assert_eq!(offset, 12 * ROW_SIZE);
    assert_eq!(table.pager().num_cached_pages(), 2);
}

#[test]
fn test_row_slot_past_capacity() {
    let temp_dir = tempdir().unwrap();
    let mut table = Table::open(temp_dir.path().join("test.db")).unwrap();

    let err = table.row_slot(TABLE_MAX_ROWS).unwrap_err();
    assert!(matches!(
        err,
        DbError::PageOutOfRange {
            page_number: TABLE_MAX_PAGES,
            ..
        }
    ));
}

#[test]
fn test_insert_writes_into_slot() {
    let temp_dir = tempdir().unwrap();
    let mut table = Table::open(temp_dir.path().join("test.db")).unwrap();

    for id in 0..14 {
        table.insert(&user(id)).unwrap();
    }

    let (page, offset) = table.row_slot(13).unwrap();
    assert_eq!(deserialize_row(&page[..], offset), user(13));
}

#[test]
fn test_scan_keeps_insertion_order() {
    let temp_dir = tempdir().unwrap();
    let mut table = Table::open(temp_dir.path().join("test.db")).unwrap();

    for id in [3, 1, 2] {
        table.insert(&user(id)).unwrap();
    }

    let ids: Vec<u32> = select_all(&mut table).iter().map(Row::id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    // scanning again starts over
    assert_eq!(table.select_all().count(), 3);
}

#[test]
fn test_table_full() {
    let temp_dir = tempdir().unwrap();
    let mut table = Table::open(temp_dir.path().join("test.db")).unwrap();

    for id in 0..TABLE_MAX_ROWS as u32 {
        table.insert(&user(id)).unwrap();
    }
    let err = table.insert(&user(u32::MAX)).unwrap_err();

    assert!(matches!(
        err,
        DbError::TableFull {
            max_rows: TABLE_MAX_ROWS
        }
    ));
    assert_eq!(table.num_rows(), TABLE_MAX_ROWS);

    let rows = select_all(&mut table);
    assert_eq!(rows.len(), TABLE_MAX_ROWS);
    assert_eq!(rows.last(), Some(&user(TABLE_MAX_ROWS as u32 - 1)));
}

#[test]
fn test_persists_across_reopen() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("test.db");
    let alice = Row::new(1, "alice", "alice@x.com").unwrap();

    let mut table = Table::open(&path).unwrap();
    table.insert(&alice).unwrap();
    table.close().unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), ROW_SIZE as u64);

    let mut table = Table::open(&path).unwrap();
    assert_eq!(table.num_rows(), 1);
    assert_eq!(select_all(&mut table), vec![alice]);
}

#[test]
fn test_file_is_flat_rows() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("test.db");

    let mut table = Table::open(&path).unwrap();
    for id in 0..30 {
        table.insert(&user(id)).unwrap();
    }
    table.close().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 30 * ROW_SIZE);
    for id in 0..30 {
        assert_eq!(deserialize_row(&bytes, id as usize * ROW_SIZE), user(id));
    }

    let mut table = Table::open(&path).unwrap();
    assert_eq!(table.num_rows(), 30);
    assert_eq!(select_all(&mut table), (0..30).map(user).collect::<Vec<_>>());
}

#[test]
fn test_reopen_and_append() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("test.db");

    let mut table = Table::open(&path).unwrap();
    for id in 0..20 {
        table.insert(&user(id)).unwrap();
    }
    table.close().unwrap();

    let mut table = Table::open(&path).unwrap();
    for id in 20..40 {
        table.insert(&user(id)).unwrap();
    }
    table.close().unwrap();

    let mut table = Table::open(&path).unwrap();
    assert_eq!(select_all(&mut table), (0..40).map(user).collect::<Vec<_>>());
}

#[test]
fn test_partial_trailing_row_is_dropped() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("test.db");

    let mut table = Table::open(&path).unwrap();
    table.insert(&user(1)).unwrap();
    table.insert(&user(2)).unwrap();
    table.close().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes.truncate(ROW_SIZE + 100);
    fs::write(&path, &bytes).unwrap();

    let mut table = Table::open(&path).unwrap();
    assert_eq!(table.num_rows(), 1);
    assert_eq!(select_all(&mut table), vec![user(1)]);

    // bytes past the end of the file read back as zeros
    let (page, _) = table.row_slot(0).unwrap();
    assert!(page[ROW_SIZE + 100..].iter().all(|&b| b == 0));
    assert!(ROW_SIZE + 100 < PAGE_DATA_SIZE && PAGE_DATA_SIZE < PAGE_SIZE);
}
