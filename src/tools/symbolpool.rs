/// Reusable storage for encoding symbols.
///
/// Encoding symbols of one block all share the same length, and consecutive
/// blocks usually do too. Buffers handed out with [`take`](SymbolPool::take)
/// and returned with [`put_back`](SymbolPool::put_back) are therefore kept for
/// the next block as long as the encoding symbol length does not change; a
/// different length drops the cached buffers and starts over.
#[derive(Debug)]
pub struct SymbolPool {
    symbol_length: usize,
    max_buffers: usize,
    buffers: Vec<Vec<u8>>,
}

impl SymbolPool {
    /// Return a new pool caching at most `max_buffers` buffers
    pub fn new(max_buffers: usize) -> SymbolPool {
        SymbolPool {
            symbol_length: 0,
            max_buffers,
            buffers: Vec::new(),
        }
    }

    /// Current encoding symbol length of the pooled buffers
    pub fn symbol_length(&self) -> usize {
        self.symbol_length
    }

    /// Return a buffer of `symbol_length` bytes, reusing a cached one when
    /// the length matches the previous request
    pub fn take(&mut self, symbol_length: usize) -> Vec<u8> {
        if symbol_length != self.symbol_length {
            log::debug!(
                "encoding symbol length changed from {} to {}, dropping {} cached buffers",
                self.symbol_length,
                symbol_length,
                self.buffers.len()
            );
            self.buffers.clear();
            self.symbol_length = symbol_length;
        }

        match self.buffers.pop() {
            Some(buffer) => buffer,
            None => vec![0; symbol_length],
        }
    }

    /// Give a buffer back to the pool. Buffers whose length no longer matches
    /// the pool's current symbol length are dropped.
    pub fn put_back(&mut self, buffer: Vec<u8>) {
        if buffer.len() == self.symbol_length && self.buffers.len() < self.max_buffers {
            self.buffers.push(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SymbolPool;

    #[test]
    pub fn test_pool_reuses_buffers() {
        crate::tests::init();
        let mut pool = SymbolPool::new(4);
        let buffer = pool.take(16);
        assert_eq!(buffer.len(), 16);
        pool.put_back(buffer);

        let buffer = pool.take(16);
        assert_eq!(buffer.len(), 16);
        assert_eq!(pool.symbol_length(), 16);
    }

    #[test]
    pub fn test_pool_reallocates_on_length_change() {
        crate::tests::init();
        let mut pool = SymbolPool::new(4);
        let buffer = pool.take(16);
        pool.put_back(buffer);

        let buffer = pool.take(32);
        assert_eq!(buffer.len(), 32);
        assert_eq!(pool.symbol_length(), 32);

        // A buffer of the old length is not cached anymore
        pool.put_back(vec![0; 16]);
        let buffer = pool.take(32);
        assert_eq!(buffer.len(), 32);
    }

    #[test]
    pub fn test_pool_capacity_bound() {
        crate::tests::init();
        let mut pool = SymbolPool::new(1);
        let _ = pool.take(8);
        pool.put_back(vec![0; 8]);
        // Over capacity, dropped
        pool.put_back(vec![0; 8]);
        assert_eq!(pool.take(8).len(), 8);
        assert_eq!(pool.take(8).len(), 8);
    }
}
