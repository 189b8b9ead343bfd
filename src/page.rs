//! Fixed-size pages and their on-disk layouts.
//!
//! Every page serializes to exactly `PAGE_SIZE` bytes.  Non-root pages carry
//! a 12-byte header `{page_type, next_page, slot_count}`; `next_page == 0`
//! terminates a chain (page id 0 is the root, which can never be a chain
//! member).  Data and Schema pages hold a slotted body, Overflow pages hold
//! opaque bytes, and the root holds database-wide metadata.

use std::io::Cursor;

use crate::serialization::{self, put_int, read_int};
use crate::slotted_page::{self, SlottedPage};

pub const PAGE_SIZE: usize = 4096;
pub const PAGE_HEADER_SIZE: usize = 12;
/// Bytes available to a page's body; the single place the header size is
/// subtracted so the layout cannot drift between page kinds.
pub const PAGE_BODY_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

pub const MAGIC_NUMBER: i32 = 0xC0DE;

/// Page ids index into the page image at `id * PAGE_SIZE`; id 0 is the root.
pub type PageId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Root,
    Data,
    Schema,
    Overflow,
    /// Reserved for a write-ahead log; never allocated.
    Log,
}

impl PageType {
    pub fn from_i32(v: i32) -> Result<Self, serialization::Error> {
        match v {
            0 => Ok(PageType::Root),
            1 => Ok(PageType::Data),
            2 => Ok(PageType::Schema),
            3 => Ok(PageType::Overflow),
            4 => Ok(PageType::Log),
            _ => Err(serialization::Error::Corrupt(format!(
                "invalid page type: {v}"
            ))),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            PageType::Root => 0,
            PageType::Data => 1,
            PageType::Schema => 2,
            PageType::Overflow => 3,
            PageType::Log => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub next_page: PageId,
    pub slot_count: i32,
}

impl PageHeader {
    fn serialize(&self, out: &mut Vec<u8>) {
        put_int(out, self.page_type.as_i32());
        put_int(out, self.next_page);
        put_int(out, self.slot_count);
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, serialization::Error> {
        let mut c = Cursor::new(bytes);
        let page_type = PageType::from_i32(read_int(&mut c)?)?;
        let next_page = read_int(&mut c)?;
        let slot_count = read_int(&mut c)?;
        if slot_count < 0 {
            return Err(serialization::Error::Corrupt(format!(
                "negative slot count: {slot_count}"
            )));
        }
        Ok(PageHeader {
            page_type,
            next_page,
            slot_count,
        })
    }
}

/// A Data or Schema page: header plus slotted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePage {
    pub header: PageHeader,
    pub body: SlottedPage,
}

impl TablePage {
    pub fn new(page_type: PageType) -> Self {
        TablePage {
            header: PageHeader {
                page_type,
                next_page: 0,
                slot_count: 0,
            },
            body: SlottedPage::new(PAGE_BODY_SIZE),
        }
    }

    pub fn add(&mut self, bytes: &[u8]) -> Result<usize, slotted_page::Error> {
        let slot = self.body.add(bytes)?;
        self.header.slot_count = self.body.slot_count() as i32;
        Ok(slot)
    }

    pub fn put(&mut self, slot: usize, bytes: &[u8]) -> Result<(), slotted_page::Error> {
        self.body.put(slot, bytes)?;
        self.header.slot_count = self.body.slot_count() as i32;
        Ok(())
    }

    pub fn read(&self, slot: usize) -> Result<Vec<u8>, slotted_page::Error> {
        self.body.read(slot)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PAGE_SIZE);
        self.header.serialize(&mut out);
        self.body.serialize(&mut out);
        debug_assert_eq!(out.len(), PAGE_SIZE);
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, slotted_page::Error> {
        if bytes.len() < PAGE_SIZE {
            return Err(serialization::Error::ShortBuffer("page").into());
        }
        let header = PageHeader::deserialize(bytes)?;
        let body = SlottedPage::deserialize(
            &bytes[PAGE_HEADER_SIZE..PAGE_SIZE],
            header.slot_count as usize,
        )?;
        Ok(TablePage { header, body })
    }
}

/// One link of an overflow chain: header plus `PAGE_BODY_SIZE` opaque bytes.
/// The payload length lives in the tuple column that points at the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowPage {
    pub header: PageHeader,
    pub data: Vec<u8>,
}

impl OverflowPage {
    /// Wraps one chunk (at most `PAGE_BODY_SIZE` bytes) in a page, padding
    /// the body with zeros.
    pub fn new(chunk: &[u8], next_page: PageId) -> Self {
        let mut data = vec![0_u8; PAGE_BODY_SIZE];
        data[..chunk.len()].copy_from_slice(chunk);
        OverflowPage {
            header: PageHeader {
                page_type: PageType::Overflow,
                next_page,
                slot_count: 0,
            },
            data,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PAGE_SIZE);
        self.header.serialize(&mut out);
        out.extend_from_slice(&self.data);
        debug_assert_eq!(out.len(), PAGE_SIZE);
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, serialization::Error> {
        if bytes.len() < PAGE_SIZE {
            return Err(serialization::Error::ShortBuffer("page"));
        }
        let header = PageHeader::deserialize(bytes)?;
        Ok(OverflowPage {
            header,
            data: bytes[PAGE_HEADER_SIZE..PAGE_SIZE].to_vec(),
        })
    }
}

/// Any non-root page, decoded by its header's page type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Table(TablePage),
    Overflow(OverflowPage),
}

impl Page {
    pub fn page_type(&self) -> PageType {
        match self {
            Page::Table(p) => p.header.page_type,
            Page::Overflow(p) => p.header.page_type,
        }
    }

    pub fn next_page(&self) -> PageId {
        match self {
            Page::Table(p) => p.header.next_page,
            Page::Overflow(p) => p.header.next_page,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Page::Table(p) => p.serialize(),
            Page::Overflow(p) => p.serialize(),
        }
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, slotted_page::Error> {
        if bytes.len() < PAGE_SIZE {
            return Err(serialization::Error::ShortBuffer("page").into());
        }
        let header = PageHeader::deserialize(bytes)?;
        match header.page_type {
            PageType::Overflow => Ok(Page::Overflow(OverflowPage::deserialize(bytes)?)),
            PageType::Data | PageType::Schema | PageType::Log => {
                Ok(Page::Table(TablePage::deserialize(bytes)?))
            }
            PageType::Root => Err(serialization::Error::Corrupt(
                "root page outside page slot 0".to_string(),
            )
            .into()),
        }
    }
}

/// Page 0.  Fixed layout padded to `PAGE_SIZE`:
/// `{page_type, magic, page_size, schema_page_start, log_page_start,
/// number_of_pages}`, each a big-endian i32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPage {
    pub schema_page_start: PageId,
    /// Reserved for a future write-ahead log; always 0.
    pub log_page_start: PageId,
    pub number_of_pages: i32,
}

impl RootPage {
    pub fn new() -> Self {
        RootPage {
            schema_page_start: 0,
            log_page_start: 0,
            number_of_pages: 1, // the root itself
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PAGE_SIZE);
        put_int(&mut out, PageType::Root.as_i32());
        put_int(&mut out, MAGIC_NUMBER);
        put_int(&mut out, PAGE_SIZE as i32);
        put_int(&mut out, self.schema_page_start);
        put_int(&mut out, self.log_page_start);
        put_int(&mut out, self.number_of_pages);
        out.resize(PAGE_SIZE, 0);
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, serialization::Error> {
        if bytes.len() < PAGE_SIZE {
            return Err(serialization::Error::ShortBuffer("root page"));
        }
        let mut c = Cursor::new(bytes);
        let page_type = PageType::from_i32(read_int(&mut c)?)?;
        if page_type != PageType::Root {
            return Err(serialization::Error::Corrupt(format!(
                "page 0 has type {page_type:?}"
            )));
        }
        let magic = read_int(&mut c)?;
        if magic != MAGIC_NUMBER {
            return Err(serialization::Error::Corrupt(format!(
                "invalid magic number: {magic:#x}"
            )));
        }
        let page_size = read_int(&mut c)?;
        if page_size != PAGE_SIZE as i32 {
            return Err(serialization::Error::Corrupt(format!(
                "page size {page_size} does not match compiled size {PAGE_SIZE}"
            )));
        }
        let schema_page_start = read_int(&mut c)?;
        let log_page_start = read_int(&mut c)?;
        let number_of_pages = read_int(&mut c)?;
        if number_of_pages < 1 {
            return Err(serialization::Error::Corrupt(format!(
                "page count {number_of_pages} below 1"
            )));
        }
        Ok(RootPage {
            schema_page_start,
            log_page_start,
            number_of_pages,
        })
    }
}

impl Default for RootPage {
    fn default() -> Self {
        Self::new()
    }
}
