use super::fixtures::populated_tables;
use crate::event::kernel_event;
use crate::reader::Reader;
use crate::writer::Writer;
use tempfile::tempdir;

#[test]
fn test_capture_file_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.scap");
    let tables = populated_tables();

    {
        let mut writer = Writer::create(&path, &tables).unwrap();
        for i in 0..100u64 {
            writer.dump_event((i % 8) as u16, &kernel_event(i, 2301, 1, 0, &[])).unwrap();
        }
        assert_eq!(writer.events_written(), 100);
        writer.close().unwrap();
    }

    let mut reader = Reader::open_path(&path).unwrap();
    assert_eq!(reader.tables(), &tables);
    let mut count = 0;
    while let Some(event) = reader.next_event().unwrap() {
        assert_eq!(event.cpuid, (count % 8) as u16);
        count += 1;
    }
    assert_eq!(count, 100);
}

#[test]
fn test_mapped_reader_matches_buffered_reader() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mapped.scap");
    let tables = populated_tables();

    let mut writer = Writer::create(&path, &tables).unwrap();
    writer.dump_event(1, &[0xDE, 0xAD]).unwrap();
    writer.dump_event(2, &[0xBE, 0xEF, 0x00, 0x01, 0x02, 0x03]).unwrap();
    writer.close().unwrap();

    let buffered: Vec<_> = Reader::open_path(&path).unwrap().collect::<Result<_, _>>().unwrap();
    let mapped_reader = Reader::open_mapped(&path).unwrap();
    assert_eq!(mapped_reader.tables(), &tables);
    let mapped: Vec<_> = mapped_reader.collect::<Result<_, _>>().unwrap();

    assert_eq!(buffered, mapped);
    assert_eq!(mapped.len(), 2);
}

#[test]
fn test_open_missing_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Reader::open_path(dir.path().join("absent.scap")),
        Err(crate::error::CaptureError::Io(_))
    ));
}
