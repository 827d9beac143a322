//! The scanner contract: a user-supplied matcher invoked over
//! successive, possibly-overlapping byte windows of a layer.

use crate::address::Address;
use crate::memory::Memory;

/// Default chunk size: 16 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 0x100_0000;
/// Default overlap: one page, 4 KiB.
pub const DEFAULT_OVERLAP: usize = 0x1000;

/// Read-only access to the memory DAG and the name of the layer being
/// scanned, bound to a scanner for the duration of one `scan` invocation
/// (the source sets `scanner.context` / `scanner.layer_name` as properties
/// before iterating; here they are simply passed into every call).
pub struct ScanContext<'a> {
    pub memory: &'a Memory,
    pub layer_name: &'a str,
}

/// A user-supplied matcher over byte windows. `Match` is treated as opaque
/// by the pipeline; it only needs to be movable across a thread boundary
/// when the scanner runs in parallel.
pub trait Scanner: Send + Sync {
    type Match: Send + 'static;

    /// Byte budget given per call. Default 16 MiB.
    fn chunk_size(&self) -> usize {
        DEFAULT_CHUNK_SIZE
    }

    /// Tail bytes of one chunk replayed as the head of the next. Default
    /// 4 KiB.
    fn overlap(&self) -> usize {
        DEFAULT_OVERLAP
    }

    /// If true (and the global disable is unset), the pipeline may invoke
    /// `scan_chunk` concurrently from a worker pool. A thread-safe scanner
    /// MUST NOT rely on per-instance mutable state across calls.
    fn thread_safe(&self) -> bool {
        false
    }

    /// Inspects `data`, where `data[0]` is the byte at `data_offset` in the
    /// layer's address space, and returns zero or more matches.
    ///
    /// MUST NOT return matches whose reported position lies entirely
    /// within the tail-overlap region, i.e. at a position
    /// `>= data_offset + self.chunk_size()`; duplicate suppression across
    /// chunk boundaries is the scanner's responsibility.
    fn scan_chunk(&self, context: &ScanContext<'_>, data: &[u8], data_offset: Address) -> Vec<Self::Match>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    struct ByteFinder(u8);

    impl Scanner for ByteFinder {
        type Match = Address;

        fn thread_safe(&self) -> bool {
            true
        }

        fn scan_chunk(&self, _ctx: &ScanContext<'_>, data: &[u8], data_offset: Address) -> Vec<Address> {
            data.iter()
                .enumerate()
                .filter(|(_, b)| **b == self.0)
                .map(|(i, _)| data_offset + i)
                .collect()
        }
    }

    #[test]
    fn defaults_are_spec_values() {
        let scanner = ByteFinder(0xFF);
        assert_eq!(scanner.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(scanner.overlap(), DEFAULT_OVERLAP);
    }

    #[test]
    fn scan_chunk_reports_absolute_offsets() {
        let memory = Memory::new();
        let scanner = ByteFinder(0xAB);
        let ctx = ScanContext {
            memory: &memory,
            layer_name: "x",
        };
        let data = [0x00, 0xAB, 0x00, 0xAB];
        let matches = scanner.scan_chunk(&ctx, &data, Address::from_usize(0x1000));
        assert_eq!(matches, vec![Address::from_usize(0x1001), Address::from_usize(0x1003)]);
    }
}
