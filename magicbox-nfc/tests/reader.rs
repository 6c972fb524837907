//! Pn532Reader against an emulated PN532 with a tag on its antenna

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use magicbox_core::{BackendError, RawRecord, TagReader};
use magicbox_nfc::frame::{self, Frame, PN532_TO_HOST};
use magicbox_nfc::{Pn532, Pn532Reader};

#[derive(Clone)]
struct FakeTag {
    uid: Vec<u8>,
    sel_res: u8,
    memory: Vec<u8>,
}

#[derive(Default)]
struct Field {
    tag: Option<FakeTag>,
    reads: usize,
}

/// Answers PN532 commands the way the chip does
struct EmulatedPn532 {
    field: Rc<RefCell<Field>>,
    rx: VecDeque<u8>,
}

impl EmulatedPn532 {
    fn answer(&mut self, command: u8, params: &[u8]) -> Vec<u8> {
        let mut field = self.field.borrow_mut();
        match command {
            0x14 => vec![0x15],
            0x02 => vec![0x03, 0x32, 0x01, 0x06, 0x07],
            0x32 => vec![0x33],
            0x4A => match &field.tag {
                Some(tag) => {
                    let mut data = vec![0x4B, 0x01, 0x01, 0x00, 0x44, tag.sel_res, tag.uid.len() as u8];
                    data.extend_from_slice(&tag.uid);
                    data
                }
                None => vec![0x4B, 0x00],
            },
            0x40 => {
                field.reads += 1;
                let page = usize::from(params[2]);
                let memory = field.tag.as_ref().map(|tag| tag.memory.clone()).unwrap_or_default();
                let mut data = vec![0x41, 0x00];
                data.extend((0..16).map(|i| memory.get(page * 4 + i).copied().unwrap_or_default()));
                data
            }
            other => panic!("unexpected command 0x{other:02X}"),
        }
    }
}

impl Read for EmulatedPn532 {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        let n = buf.len().min(self.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for EmulatedPn532 {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.first() == Some(&0x55) {
            return Ok(buf.len());
        }
        let Ok(Frame::Data(body)) = frame::read_frame(&mut &buf[..]) else {
            panic!("host sent a malformed frame: {buf:02X?}");
        };
        let response = self.answer(body[1], &body[2..]);
        self.rx.extend(frame::ACK);
        self.rx.extend(frame::encode(PN532_TO_HOST, &response).unwrap());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn reader() -> (Pn532Reader<EmulatedPn532>, Rc<RefCell<Field>>) {
    let field = Rc::new(RefCell::new(Field::default()));
    let mut device = Pn532::new(EmulatedPn532 {
        field: Rc::clone(&field),
        rx: VecDeque::new(),
    });
    device.init().unwrap();
    (Pn532Reader::new(device), field)
}

/// NTAG213 memory holding `message` in an NDEF TLV
fn ntag(message: &[u8]) -> Vec<u8> {
    let mut memory = vec![0u8; 16];
    memory[12..16].copy_from_slice(&[0xE1, 0x10, 0x12, 0x00]);
    memory.extend_from_slice(&[0x03, message.len() as u8]);
    memory.extend_from_slice(message);
    memory.push(0xFE);
    memory.resize(180, 0);
    memory
}

fn spotify_tag_message() -> Vec<u8> {
    let uri = b"open.spotify.com/album/6wiUBliPe76YAVpNEdidpY";
    let mut message = vec![0x91, 0x01, (uri.len() + 1) as u8, b'U', 0x04];
    message.extend_from_slice(uri);

    let text = b"mode:shuffle";
    message.extend_from_slice(&[0x51, 0x01, (text.len() + 3) as u8, b'T', 0x02, b'e', b'n']);
    message.extend_from_slice(text);
    message
}

fn place(field: &Rc<RefCell<Field>>, uid: &[u8], sel_res: u8, memory: Vec<u8>) {
    field.borrow_mut().tag = Some(FakeTag {
        uid: uid.to_vec(),
        sel_res,
        memory,
    });
}

#[test]
fn test_reads_ndef_records() {
    let (mut reader, field) = reader();
    place(&field, &[0x04, 0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0x80], 0x00, ntag(&spotify_tag_message()));

    let records = reader.poll().unwrap();

    assert_eq!(
        records,
        Some(vec![
            RawRecord::uri("https://open.spotify.com/album/6wiUBliPe76YAVpNEdidpY"),
            RawRecord::text("mode:shuffle"),
        ])
    );
    // capability container plus the 4-page blocks covering the message
    assert_eq!(field.borrow().reads, 1 + 5);
}

#[test]
fn test_resting_tag_is_reported_once() {
    let (mut reader, field) = reader();
    let uid = [0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    place(&field, &uid, 0x00, ntag(&spotify_tag_message()));

    assert!(reader.poll().unwrap().is_some());
    assert_eq!(reader.poll().unwrap(), None);
    assert_eq!(reader.poll().unwrap(), None);

    field.borrow_mut().tag = None;
    assert_eq!(reader.poll().unwrap(), None);

    place(&field, &uid, 0x00, ntag(&spotify_tag_message()));
    assert!(reader.poll().unwrap().is_some());
}

#[test]
fn test_swapping_tags_reports_the_new_one() {
    let (mut reader, field) = reader();
    place(&field, &[0x04, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01], 0x00, ntag(&spotify_tag_message()));
    assert!(reader.poll().unwrap().is_some());

    let stop = [0xD1, 0x01, 0x07, b'T', 0x02, b'e', b'n', b's', b't', b'o', b'p'];
    place(&field, &[0x04, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02], 0x00, ntag(&stop));
    assert_eq!(reader.poll().unwrap(), Some(vec![RawRecord::text("stop")]));
}

#[test]
fn test_non_type2_tag_yields_no_records() {
    let (mut reader, field) = reader();
    place(&field, &[0xDE, 0xAD, 0xBE, 0xEF], 0x08, Vec::new());

    assert_eq!(reader.poll().unwrap(), Some(Vec::new()));
    assert_eq!(field.borrow().reads, 0);
}

#[test]
fn test_blank_tag_yields_no_records() {
    let (mut reader, field) = reader();
    place(&field, &[0x04, 0x09, 0x09, 0x09, 0x09, 0x09, 0x09], 0x00, vec![0u8; 180]);

    assert_eq!(reader.poll().unwrap(), Some(Vec::new()));
}

#[test]
fn test_garbled_message_yields_no_records() {
    let (mut reader, field) = reader();
    // chunked record
    place(&field, &[0x04, 0x07, 0x07, 0x07, 0x07, 0x07, 0x07], 0x00, ntag(&[0xB1, 0x01, 0x01, b'T', 0x02]));

    assert_eq!(reader.poll().unwrap(), Some(Vec::new()));
}

#[test]
fn test_unplugged_reader_is_unavailable() {
    struct Unplugged;

    impl Read for Unplugged {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
        }
    }

    impl Write for Unplugged {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut reader = Pn532Reader::new(Pn532::new(Unplugged));
    assert!(matches!(reader.poll(), Err(BackendError::Unavailable(_))));
}
