//! The scan pipeline entry point: prepares bounds, partitions the layer's
//! mapped range into chunks via the layer's own `scan_iterator`, and
//! drives either a sequential or a worker-pool execution of the scanner
//! over those chunks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};

use crate::address::Address;
use crate::error::{LayerError, LayerException, Result};
use crate::memory::log_skipped_span;
use crate::memory::Memory;
use crate::scan::iterator::ScanChunk;
use crate::scanner::{ScanContext, Scanner};

/// Interval the parallel driver polls worker-pool readiness at, matching
/// the source's `result.wait(0.1)`.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn scan_metric(min_addr: Address, max_addr: Address, value: Address) -> f64 {
    let span = max_addr - min_addr;
    if span == 0 {
        return 100.0;
    }
    let numerator = value.as_usize().saturating_sub(min_addr.as_usize()) as f64;
    (numerator * 100.0 / span as f64).max(0.0)
}

fn read_chunk_data(
    memory: &Memory,
    scanned_layer: &str,
    chunk: &ScanChunk,
) -> std::result::Result<Vec<u8>, LayerException> {
    let mut data = Vec::new();
    for span in &chunk.spans {
        match memory.read(&span.layer_name, span.mapped_offset, span.length, false) {
            Ok(bytes) => data.extend_from_slice(&bytes),
            Err(LayerException::InvalidAddress(e)) => {
                log_skipped_span(&span.layer_name, scanned_layer, e.offset);
            }
            Err(other) => return Err(other),
        }
    }
    Ok(data)
}

fn scan_chunk<S: Scanner>(
    memory: &Memory,
    scanner: &S,
    layer_name: &str,
    chunk: &ScanChunk,
) -> std::result::Result<Vec<S::Match>, LayerException> {
    let data = read_chunk_data(memory, layer_name, chunk)?;
    let data_offset = chunk.chunk_end - data.len();
    let ctx = ScanContext { memory, layer_name };
    Ok(scanner.scan_chunk(&ctx, &data, data_offset))
}

/// Scans `layer_name` in `memory` with `scanner`, over `[min_addr,
/// max_addr)` clamped to the layer's own bounds (defaulting to the full
/// range). Calls `progress_cb(percent, description)` before each chunk in
/// sequential mode, or on a ~100ms poll interval in parallel mode.
///
/// Dispatches to a worker pool when `scanner.thread_safe()` is true and
/// the `disable_parallel_scan` feature is not enabled; sequentially
/// otherwise. Sequential-mode matches preserve `scan_iterator` (ascending
/// offset) order; parallel-mode matches are returned in chunk-completion
/// order, which is not guaranteed to match address order.
///
/// `strict`: when `false` (the default backward-compatible behaviour), any
/// error raised while reading a chunk or invoking the scanner that is not
/// a per-span `InvalidAddress` (already tolerated) is logged and the scan
/// terminates early, returning the matches collected so far. When `true`,
/// such an error is propagated to the caller instead.
pub fn scan<S: Scanner>(
    memory: &Memory,
    layer_name: &str,
    scanner: &S,
    mut progress_cb: Option<&mut dyn FnMut(f64, &str)>,
    min_addr: Option<Address>,
    max_addr: Option<Address>,
    strict: bool,
) -> Result<Vec<S::Match>> {
    let layer = memory
        .get(layer_name)
        .ok_or_else(|| LayerException::Layer(LayerError::NoSuchLayer(layer_name.to_string())))?;

    // Preparation: bound resolution happens outside the lenient catch-all,
    // so an out-of-range request always surfaces as an error.
    let min_addr = min_addr.unwrap_or_else(|| layer.minimum_address()).max(layer.minimum_address());
    let max_addr = max_addr.unwrap_or_else(|| layer.maximum_address()).min(layer.maximum_address());
    if min_addr > max_addr {
        return Err(LayerException::OutOfRange(format!(
            "minimum address {min_addr} cannot be larger than maximum address {max_addr}"
        )));
    }

    let chunks = layer.scan_iterator(memory, min_addr, max_addr, scanner.chunk_size(), scanner.overlap());
    let description = format!("Scanning {layer_name} using a scanner");

    let use_parallel = scanner.thread_safe() && !cfg!(feature = "disable_parallel_scan");

    let result = if use_parallel {
        scan_parallel(memory, scanner, layer_name, chunks, min_addr, max_addr, progress_cb.as_deref_mut(), &description, strict)
    } else {
        scan_sequential(memory, scanner, layer_name, chunks, min_addr, max_addr, progress_cb.as_deref_mut(), &description, strict)
    };

    match result {
        Ok(matches) => Ok(matches),
        Err(e) if strict => Err(e),
        Err(e) => {
            debug!("scan failure: {e}");
            Ok(Vec::new())
        }
    }
}

fn scan_sequential<S: Scanner>(
    memory: &Memory,
    scanner: &S,
    layer_name: &str,
    chunks: Vec<ScanChunk>,
    min_addr: Address,
    max_addr: Address,
    mut progress_cb: Option<&mut dyn FnMut(f64, &str)>,
    description: &str,
    strict: bool,
) -> std::result::Result<Vec<S::Match>, LayerException> {
    let mut matches = Vec::new();
    for chunk in &chunks {
        if let Some(cb) = progress_cb.as_deref_mut() {
            cb(scan_metric(min_addr, max_addr, chunk.chunk_end), description);
        }
        match scan_chunk(memory, scanner, layer_name, chunk) {
            Ok(mut chunk_matches) => matches.append(&mut chunk_matches),
            Err(e) if strict => return Err(e),
            Err(e) => {
                warn!("scan chunk failed, terminating scan: {e}");
                break;
            }
        }
    }
    Ok(matches)
}

fn scan_parallel<S: Scanner>(
    memory: &Memory,
    scanner: &S,
    layer_name: &str,
    chunks: Vec<ScanChunk>,
    min_addr: Address,
    max_addr: Address,
    mut progress_cb: Option<&mut dyn FnMut(f64, &str)>,
    description: &str,
    strict: bool,
) -> std::result::Result<Vec<S::Match>, LayerException> {
    let pool = rayon_core::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build()
        .map_err(|e| LayerException::OutOfRange(format!("failed to start scan worker pool: {e}")))?;

    let total = chunks.len();
    let completed = Arc::new(AtomicUsize::new(0));
    let progress = Arc::new(AtomicUsize::new(min_addr.as_usize()));
    let (tx, rx) = crossbeam::channel::unbounded();

    pool.scope(|scope| {
        for chunk in chunks {
            let tx = tx.clone();
            let completed = Arc::clone(&completed);
            let progress = Arc::clone(&progress);
            scope.spawn(move |_| {
                let outcome = scan_chunk(memory, scanner, layer_name, &chunk);
                progress.store(chunk.chunk_end.as_usize(), Ordering::Relaxed);
                completed.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        while completed.load(Ordering::SeqCst) < total {
            if let Some(cb) = progress_cb.as_deref_mut() {
                cb(scan_metric(min_addr, max_addr, Address::from_usize(progress.load(Ordering::Relaxed))), description);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    });

    let mut matches = Vec::new();
    for outcome in rx.try_iter() {
        match outcome {
            Ok(mut chunk_matches) => matches.append(&mut chunk_matches),
            Err(e) if strict => {
                error!("parallel scan chunk failed: {e}");
                return Err(e);
            }
            Err(e) => warn!("parallel scan chunk failed, dropping its results: {e}"),
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::data::BufferLayer;
    use crate::layer::translation::MappedTranslationLayer;
    use crate::metadata::Metadata;
    use crate::scanner::ScanContext;

    struct ByteFinder {
        byte: u8,
        thread_safe: bool,
    }

    impl Scanner for ByteFinder {
        type Match = Address;

        fn thread_safe(&self) -> bool {
            self.thread_safe
        }

        fn scan_chunk(&self, _ctx: &ScanContext<'_>, data: &[u8], data_offset: Address) -> Vec<Address> {
            data.iter()
                .enumerate()
                .filter(|(_, b)| **b == self.byte)
                .map(|(i, _)| data_offset + i)
                .collect()
        }
    }

    struct Deadbeef;

    impl Scanner for Deadbeef {
        type Match = Address;

        fn chunk_size(&self) -> usize {
            4096
        }

        fn overlap(&self) -> usize {
            16
        }

        fn scan_chunk(&self, _ctx: &ScanContext<'_>, data: &[u8], data_offset: Address) -> Vec<Address> {
            data.windows(4)
                .enumerate()
                .filter(|(_, w)| *w == [0xDE, 0xAD, 0xBE, 0xEF])
                .map(|(i, _)| data_offset + i)
                .collect()
        }
    }

    fn memory_with_buffer(byte: u8, len: usize) -> Memory {
        let mut memory = Memory::new();
        memory
            .add_layer(Box::new(BufferLayer::new("d", vec![byte; len], Metadata::new())))
            .unwrap();
        memory
    }

    #[test]
    fn sequential_scan_covers_whole_buffer() {
        let memory = memory_with_buffer(0x00, 10_000);
        memory.write("d", Address::from_usize(5), &[0xFFu8; 3]).unwrap();
        let scanner = ByteFinder { byte: 0xFF, thread_safe: false };
        let matches = scan(&memory, "d", &scanner, None, None, None, true).unwrap();
        assert_eq!(matches, vec![Address::from_usize(5), Address::from_usize(6), Address::from_usize(7)]);
    }

    #[test]
    fn progress_callback_invoked_and_reaches_100() {
        let memory = memory_with_buffer(0x00, 4096);
        let scanner = ByteFinder { byte: 0xFF, thread_safe: false };
        let mut last = 0.0f64;
        {
            let mut cb = |pct: f64, _desc: &str| last = pct;
            scan(&memory, "d", &scanner, Some(&mut cb), None, None, true).unwrap();
        }
        assert!((0.0..=100.0).contains(&last));
    }

    #[test]
    fn out_of_range_bounds_rejected() {
        let memory = memory_with_buffer(0x00, 4096);
        let scanner = ByteFinder { byte: 0xFF, thread_safe: false };
        let err = scan(
            &memory,
            "d",
            &scanner,
            None,
            Some(Address::from_usize(100)),
            Some(Address::from_usize(10)),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, LayerException::OutOfRange(_)));
    }

    #[test]
    fn scan_across_gap_never_reports_straddling_pattern() {
        let mut memory = Memory::new();
        let mut d = vec![0u8; 0x2000];
        // Place 0xDEADBEEF straddling D's offset 0x1000 (the mapped/unmapped boundary).
        d[0x0FFE..0x1002].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        memory.add_layer(Box::new(BufferLayer::new("D", d, Metadata::new()))).unwrap();
        let t = MappedTranslationLayer::new(
            "T",
            "D",
            vec![(Address::from_usize(0), Address::from_usize(0), 0x1000)],
            Address::from_usize(0x1FFF),
            Metadata::new(),
        );
        memory.add_layer(Box::new(t)).unwrap();

        let scanner = Deadbeef;
        let matches = scan(&memory, "T", &scanner, None, None, None, true).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn parallel_and_sequential_scans_agree_as_sets() {
        let mut memory = memory_with_buffer(0x00, 200_000);
        for off in (0..200_000).step_by(997) {
            memory.write("d", Address::from_usize(off), &[0xFFu8]).unwrap();
        }
        let seq = ByteFinder { byte: 0xFF, thread_safe: false };
        let par = ByteFinder { byte: 0xFF, thread_safe: true };
        let seq_matches = scan(&memory, "d", &seq, None, None, None, true).unwrap();
        let par_matches = scan(&memory, "d", &par, None, None, None, true).unwrap();

        use std::collections::HashSet;
        let seq_set: HashSet<_> = seq_matches.into_iter().collect();
        let par_set: HashSet<_> = par_matches.into_iter().collect();
        assert_eq!(seq_set, par_set);
    }
}
