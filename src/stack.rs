use crate::error::Chip8Error;

/// how many return addresses fit before the first resize
pub const STACK_INITIAL_CAPACITY: usize = 16;

/// beyond this depth a program is assumed to be recursing without end
pub const STACK_MAX_DEPTH: usize = 4096;

/// Growable LIFO of return addresses.
///
/// The COSMAC VIP only had room for a dozen or so levels in its reserved
/// page of RAM; here the backing store starts at 16 entries and doubles
/// whenever it fills up, halving again once it is mostly empty.
#[derive(Debug, Clone)]
pub struct CallStack {
    entries: Vec<u16>,
    capacity: usize,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            entries: Vec::with_capacity(STACK_INITIAL_CAPACITY),
            capacity: STACK_INITIAL_CAPACITY,
        }
    }

    /// push a return address, doubling the backing store first if it is full
    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.entries.len() >= STACK_MAX_DEPTH {
            return Err(Chip8Error::StackOverflow {
                depth: self.entries.len(),
            });
        }
        if self.entries.len() == self.capacity {
            self.resize(self.capacity * 2);
        }
        self.entries.push(addr);
        Ok(())
    }

    /// pop the most recent return address; `None` means the program returned
    /// from a subroutine it never called
    pub fn pop(&mut self) -> Option<u16> {
        let addr = self.entries.pop()?;
        if self.capacity > STACK_INITIAL_CAPACITY && self.entries.len() < self.capacity / 2 {
            self.resize(self.capacity / 2);
        }
        Some(addr)
    }

    pub fn peek(&self) -> Option<u16> {
        self.entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// logical capacity of the backing store
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.resize(STACK_INITIAL_CAPACITY);
    }

    fn resize(&mut self, capacity: usize) {
        // never shrink below what's already stored
        let capacity = capacity.max(self.entries.len());
        if capacity > self.entries.capacity() {
            self.entries.reserve_exact(capacity - self.entries.len());
        } else {
            self.entries.shrink_to(capacity);
        }
        self.capacity = capacity;
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
