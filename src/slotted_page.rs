//! In-page tuple storage: a slot index growing forward from the front of the
//! page body, cells packed from the back toward the front, free space in the
//! middle.
//!
//! Each cell is a length-prefixed byte string.  A slot holds the body offset
//! of its cell, or `-1` once the cell has been rewritten elsewhere
//! (a tombstone).  Cell space is never compacted; a page that fills up is
//! simply chained to a fresh one by the layer above.

use std::io::Cursor;

use crate::serialization;

/// Slot offset value marking a cell that was moved by `put`.
const TOMBSTONE: i32 = -1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no space left in page")]
    NoSpace,
    #[error("bad slot index {0}")]
    BadSlot(usize),
    #[error(transparent)]
    Codec(#[from] serialization::Error),
}

/// The body of one Data or Schema page.  The fixed page header is managed by
/// the layer above; `body_size` here is the page size minus that header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlottedPage {
    /// Slot index: cell offsets into `cells`, in insertion order.
    slots: Vec<i32>,
    /// Mirror of the cell region.  Cells occupy `[last_offset..]`; the prefix
    /// is dead space that also covers where the slot index serializes to.
    cells: Vec<u8>,
    /// Where the most recently added cell begins.
    last_offset: usize,
}

impl SlottedPage {
    pub fn new(body_size: usize) -> Self {
        SlottedPage {
            slots: vec![],
            cells: vec![0_u8; body_size],
            last_offset: body_size,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Appends a cell and returns its slot index, or `NoSpace` when the slot
    /// index and the cell region would collide.  A failed add leaves the page
    /// unchanged.
    pub fn add(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let mut cell = vec![];
        serialization::put_bytes(&mut cell, bytes);
        if !self.has_space(cell.len()) {
            return Err(Error::NoSpace);
        }
        let offset = self.last_offset - cell.len();
        self.cells[offset..self.last_offset].copy_from_slice(&cell);
        self.last_offset = offset;
        self.slots.push(offset as i32);
        Ok(self.slots.len() - 1)
    }

    /// Rewrites the cell under `slot`.  Shrinking updates are done in place;
    /// a growing update appends the new cell and redirects the slot, leaving
    /// a tombstone where the fresh slot was created.
    // TODO: reclaim tombstoned cell space instead of letting pages fill up.
    pub fn put(&mut self, slot: usize, bytes: &[u8]) -> Result<(), Error> {
        let existing = self.read(slot)?;
        if bytes.len() <= existing.len() {
            let mut cell = vec![];
            serialization::put_bytes(&mut cell, bytes);
            let offset = self.slots[slot] as usize;
            self.cells[offset..offset + cell.len()].copy_from_slice(&cell);
            return Ok(());
        }
        let new_slot = self.add(bytes)?;
        self.slots[slot] = self.slots[new_slot];
        self.slots[new_slot] = TOMBSTONE;
        Ok(())
    }

    /// Returns the cell bytes under `slot`.  Out-of-range and tombstoned
    /// slots are rejected.
    pub fn read(&self, slot: usize) -> Result<Vec<u8>, Error> {
        let offset = *self.slots.get(slot).ok_or(Error::BadSlot(slot))?;
        if offset == TOMBSTONE {
            return Err(Error::BadSlot(slot));
        }
        let mut c = Cursor::new(&self.cells[offset as usize..]);
        Ok(serialization::read_bytes(&mut c)?)
    }

    /// Cells in slot order, skipping tombstones.
    pub fn iter(&self) -> impl Iterator<Item = Result<Vec<u8>, Error>> + '_ {
        (0..self.slots.len())
            .filter(|i| self.slots[*i] != TOMBSTONE)
            .map(|i| self.read(i))
    }

    fn has_space(&self, cell_len: usize) -> bool {
        let free = self.last_offset as i64 - cell_len as i64 - (self.slots.len() as i64 + 1) * 4;
        free > 0
    }

    /// Slot offsets, zero padding, then the cell region, `body_size` bytes
    /// in total.
    pub fn serialize(&self, out: &mut Vec<u8>) {
        for offset in &self.slots {
            serialization::put_int(out, *offset);
        }
        out.extend(std::iter::repeat(0_u8).take(self.last_offset - self.slots.len() * 4));
        out.extend_from_slice(&self.cells[self.last_offset..]);
    }

    /// Rebuilds a page body from its serialized form.  `slot_count` comes
    /// from the page header.
    pub fn deserialize(body: &[u8], slot_count: usize) -> Result<Self, Error> {
        let mut c = Cursor::new(body);
        let mut slots = Vec::with_capacity(slot_count);
        let mut last_offset = body.len();
        for _ in 0..slot_count {
            let offset = serialization::read_int(&mut c)?;
            if offset != TOMBSTONE && (offset < 0 || offset as usize >= body.len()) {
                return Err(serialization::Error::Corrupt(format!(
                    "slot offset {offset} outside page body"
                ))
                .into());
            }
            if offset != TOMBSTONE && (offset as usize) < last_offset {
                last_offset = offset as usize;
            }
            slots.push(offset);
        }
        if last_offset < slots.len() * 4 {
            return Err(serialization::Error::Corrupt(format!(
                "cell region at {last_offset} overlaps slot index"
            ))
            .into());
        }
        let mut cells = vec![0_u8; body.len()];
        cells[last_offset..].copy_from_slice(&body[last_offset..]);
        Ok(SlottedPage {
            slots,
            cells,
            last_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page_with_data(body_size: usize) -> (SlottedPage, Vec<(usize, &'static str)>) {
        let mut p = SlottedPage::new(body_size);
        let mut inserted = vec![];
        for s in ["hello", "world", "foobar"] {
            let slot = p.add(s.as_bytes()).unwrap();
            inserted.push((slot, s));
        }
        (p, inserted)
    }

    #[test]
    fn test_add_and_read() {
        let (p, inserted) = page_with_data(64);
        assert_eq!(inserted.len(), 3);
        for (slot, expected) in inserted {
            assert_eq!(p.read(slot).unwrap(), expected.as_bytes());
        }
    }

    #[test]
    fn test_read_bad_slot() {
        let (p, _) = page_with_data(64);
        assert_eq!(p.read(17), Err(Error::BadSlot(17)));
    }

    #[test]
    fn test_no_space_leaves_page_unchanged() {
        let mut p = SlottedPage::new(32);
        p.add(b"0123456789").unwrap();
        let before = p.clone();
        assert_eq!(p.add(b"ten more bytes!!"), Err(Error::NoSpace));
        assert_eq!(p, before);
    }

    #[test]
    fn test_put_in_place() {
        let (mut p, _) = page_with_data(64);
        p.put(1, b"earth").unwrap();
        assert_eq!(p.read(1).unwrap(), b"earth");
        assert_eq!(p.slot_count(), 3);
    }

    #[test]
    fn test_put_shorter_then_read() {
        let (mut p, _) = page_with_data(64);
        p.put(2, b"ab").unwrap();
        assert_eq!(p.read(2).unwrap(), b"ab");
    }

    #[test]
    fn test_put_growing_tombstones_old_slot() {
        let mut p = SlottedPage::new(128);
        p.add(b"first").unwrap();
        p.add(b"second").unwrap();
        p.put(0, b"something much longer than first").unwrap();
        assert_eq!(p.read(0).unwrap(), b"something much longer than first");
        assert_eq!(p.read(1).unwrap(), b"second");
        // The redirected cell's fresh slot is a tombstone.
        assert_eq!(p.read(2), Err(Error::BadSlot(2)));
        let cells: Vec<Vec<u8>> = p.iter().map(|c| c.unwrap()).collect();
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_iter_in_slot_order() {
        let (p, _) = page_with_data(64);
        let cells: Vec<Vec<u8>> = p.iter().map(|c| c.unwrap()).collect();
        assert_eq!(cells, vec![b"hello".to_vec(), b"world".to_vec(), b"foobar".to_vec()]);
    }

    #[test]
    fn test_serialize_length_and_empty() {
        let (p, _) = page_with_data(64);
        let mut out = vec![];
        p.serialize(&mut out);
        assert_eq!(out.len(), 64);

        let mut out = vec![];
        SlottedPage::new(64).serialize(&mut out);
        assert_eq!(out, vec![0_u8; 64]);
    }

    #[test]
    fn test_serialize_round_trip() {
        let (p, inserted) = page_with_data(64);
        let mut out = vec![];
        p.serialize(&mut out);
        let q = SlottedPage::deserialize(&out, inserted.len()).unwrap();
        assert_eq!(p, q);
        for (slot, expected) in inserted {
            assert_eq!(q.read(slot).unwrap(), expected.as_bytes());
        }
    }

    #[test]
    fn test_deserialize_rejects_wild_offset() {
        let mut out = vec![];
        SlottedPage::new(64).serialize(&mut out);
        out[0..4].copy_from_slice(&500_i32.to_be_bytes());
        assert!(matches!(
            SlottedPage::deserialize(&out, 1),
            Err(Error::Codec(serialization::Error::Corrupt(_)))
        ));
    }
}
