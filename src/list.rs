use parking_lot::Mutex;

/// A single named list: an integer sequence with tail semantics.
///
/// Every method takes the list's own lock for exactly one operation, so two
/// lists never contend and no lock outlives the call that took it.
#[derive(Default, Debug)]
pub struct List {
    items: Mutex<Vec<i32>>,
}

/// Maps a caller-supplied index onto a slot, if it falls inside `0..len`.
pub fn slot(len: usize, ix: i32) -> Option<usize> {
    if ix < 0 {
        return None;
    }
    let ix = ix as usize;
    if ix < len {
        Some(ix)
    } else {
        None
    }
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `val` and returns the new length.
    pub fn push_back(&self, val: i32) -> usize {
        let mut items = self.items.lock();
        items.push(val);
        items.len()
    }

    /// Removes the most recently appended value, returning it with the
    /// length left behind.
    pub fn pop_back(&self) -> Option<(i32, usize)> {
        let mut items = self.items.lock();
        let val = items.pop()?;
        Some((val, items.len()))
    }

    pub fn get(&self, ix: i32) -> Option<i32> {
        let items = self.items.lock();
        slot(items.len(), ix).map(|ix| items[ix])
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
