//! Manages the page image: one contiguous byte buffer holding every page of
//! the database, with the root page cached for fast metadata updates.
//!
//! The pager owns all page bytes.  Readers get decoded copies; writers hand
//! back a full serialized page which is written over the old bytes.  Nothing
//! here touches the file system: dump and load work against byte buffers and
//! the command loop decides where those bytes live.

use crate::page::{OverflowPage, Page, PageId, RootPage, PAGE_BODY_SIZE, PAGE_SIZE};
use crate::serialization;
use crate::slotted_page;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("page {0} is outside the page image")]
    PageOutOfBounds(PageId),
    #[error(transparent)]
    Codec(#[from] serialization::Error),
    #[error(transparent)]
    Slotted(#[from] slotted_page::Error),
    #[error("page image ends before page {0}")]
    Truncated(PageId),
    #[error("corrupt page image: {0}")]
    CorruptImage(String),
}

pub struct Pager {
    /// The page image.  May be over-allocated; only the first
    /// `number_of_pages * PAGE_SIZE` bytes are meaningful.
    image: Vec<u8>,
    /// Cached copy of page 0, re-serialized into the image on every change.
    root: RootPage,
}

impl Pager {
    pub fn new() -> Self {
        let root = RootPage::new();
        Pager {
            image: root.serialize(),
            root,
        }
    }

    pub fn root(&self) -> &RootPage {
        &self.root
    }

    pub fn number_of_pages(&self) -> i32 {
        self.root.number_of_pages
    }

    pub fn set_schema_page_start(&mut self, id: PageId) {
        self.root.schema_page_start = id;
        self.persist_root();
    }

    fn persist_root(&mut self) {
        let bytes = self.root.serialize();
        self.write_page_bytes(0, &bytes);
    }

    /// Decodes the page stored under `id`.  The root is not a `Page`; chains
    /// terminate at 0 before ever asking for it.
    pub fn get_page(&self, id: PageId) -> Result<Page, Error> {
        if id <= 0 || id >= self.root.number_of_pages {
            return Err(Error::PageOutOfBounds(id));
        }
        let offset = id as usize * PAGE_SIZE;
        Ok(Page::deserialize(&self.image[offset..offset + PAGE_SIZE])?)
    }

    /// Writes a full serialized page over the bytes under `id`.  Succeeds
    /// for any allocated id; the image grows geometrically when the write
    /// lands past its end.
    pub fn persist_page(&mut self, id: PageId, page: &Page) -> Result<(), Error> {
        if id <= 0 || id >= self.root.number_of_pages {
            return Err(Error::PageOutOfBounds(id));
        }
        self.write_page_bytes(id, &page.serialize());
        Ok(())
    }

    fn write_page_bytes(&mut self, id: PageId, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), PAGE_SIZE);
        let end = (id as usize + 1) * PAGE_SIZE;
        if self.image.len() < end {
            self.image.resize(end * 2, 0);
        }
        self.image[end - PAGE_SIZE..end].copy_from_slice(bytes);
    }

    /// Appends `page` as a fresh page, returning its id.  Bumps the page
    /// count and re-serializes the root.  Chain linking is the caller's
    /// business: a freshly appended page is unreachable until some
    /// `next_page` (or a root/catalog start slot) points at it.
    pub fn append_page(&mut self, page: &Page) -> PageId {
        let id = self.root.number_of_pages;
        self.write_page_bytes(id, &page.serialize());
        self.root.number_of_pages += 1;
        self.persist_root();
        id
    }

    /// Splits `payload` into `PAGE_BODY_SIZE` chunks, persists them as a
    /// chain of Overflow pages and returns the id of the first one.  The
    /// root is re-serialized once at the end.
    pub fn allocate_overflow(&mut self, payload: &[u8]) -> PageId {
        let first_id = self.root.number_of_pages;
        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![&[]]
        } else {
            payload.chunks(PAGE_BODY_SIZE).collect()
        };
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            let id = first_id + i as PageId;
            let next = if i == last { 0 } else { id + 1 };
            let page = OverflowPage::new(chunk, next);
            self.write_page_bytes(id, &page.serialize());
        }
        self.root.number_of_pages += chunks.len() as i32;
        self.persist_root();
        first_id
    }

    /// Reassembles an overflow chain into its payload of `length` bytes.
    pub fn read_overflow(&self, first_id: PageId, length: usize) -> Result<Vec<u8>, Error> {
        let mut payload = Vec::with_capacity(length);
        let mut id = first_id;
        while payload.len() < length {
            if id == 0 {
                return Err(Error::CorruptImage(format!(
                    "overflow chain ended {} bytes short",
                    length - payload.len()
                )));
            }
            let page = match self.get_page(id)? {
                Page::Overflow(p) => p,
                other => {
                    return Err(Error::CorruptImage(format!(
                        "page {id} in overflow chain has type {:?}",
                        other.page_type()
                    )))
                }
            };
            let take = (length - payload.len()).min(PAGE_BODY_SIZE);
            payload.extend_from_slice(&page.data[..take]);
            id = page.header.next_page;
        }
        Ok(payload)
    }

    /// The whole image: every page in id order, `number_of_pages * PAGE_SIZE`
    /// bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.image[..self.root.number_of_pages as usize * PAGE_SIZE].to_vec()
    }

    /// Rebuilds a pager from a dumped image, validating the root and every
    /// page header along the way.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < PAGE_SIZE {
            return Err(Error::Truncated(0));
        }
        let root = RootPage::deserialize(&bytes[..PAGE_SIZE])?;
        let expected = root.number_of_pages as usize * PAGE_SIZE;
        if bytes.len() < expected {
            return Err(Error::Truncated(
                (bytes.len() / PAGE_SIZE) as PageId,
            ));
        }
        if bytes.len() != expected {
            return Err(Error::CorruptImage(format!(
                "image holds {} bytes but the root declares {} pages",
                bytes.len(),
                root.number_of_pages
            )));
        }
        for id in 1..root.number_of_pages {
            let offset = id as usize * PAGE_SIZE;
            Page::deserialize(&bytes[offset..offset + PAGE_SIZE])
                .map_err(|e| Error::CorruptImage(format!("page {id}: {e}")))?;
        }
        Ok(Pager {
            image: bytes.to_vec(),
            root,
        })
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}
