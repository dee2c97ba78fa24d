// Copyright (C) 2026 The sampad authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The sample store: decoded buffers and the bounded in-memory cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::SampleError;
use super::wav::decode_wav;
use crate::audio::OUTPUT_SAMPLE_RATE;

/// Default ceiling for resident sample bytes.
pub const DEFAULT_CACHE_BYTES: usize = 10 * 1024 * 1024;

/// Identifies a loaded sample. Used as the index into the engine's sample
/// table, so trigger messages stay `Copy` and resolution on the render path
/// is a bounds-checked array access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(u32);

impl SampleId {
    /// Creates an id for the given table index.
    pub fn from_index(index: u32) -> Self {
        SampleId(index)
    }

    /// Returns the table index for this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The engine's read-only view of loaded samples, indexed by `SampleId`.
pub type SampleTable = Vec<Option<Arc<SampleBuffer>>>;

/// An immutable, fully decoded sample.
///
/// Created once by the store; shared by reference across every voice that
/// plays it and never mutated afterwards.
pub struct SampleBuffer {
    /// The id assigned at load time.
    id: SampleId,
    /// Interleaved stereo frames at the output rate.
    frames: Vec<f32>,
    /// Bit depth of the source file (diagnostics only).
    source_bits: u16,
    /// Sample rate of the source file (diagnostics only).
    source_rate: u32,
}

impl SampleBuffer {
    /// Creates a buffer from already-normalized interleaved stereo frames.
    pub fn from_frames(id: SampleId, frames: Vec<f32>, source_bits: u16, source_rate: u32) -> Self {
        Self {
            id,
            frames,
            source_bits,
            source_rate,
        }
    }

    /// Returns the id assigned to this buffer.
    pub fn id(&self) -> SampleId {
        self.id
    }

    /// Returns the interleaved stereo frames.
    pub fn frames(&self) -> &[f32] {
        &self.frames
    }

    /// Returns the number of stereo frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len() / 2
    }

    /// Returns the playback duration at the output rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / OUTPUT_SAMPLE_RATE as f64)
    }

    /// Returns the resident size of the frame data in bytes.
    pub fn memory_size(&self) -> usize {
        self.frames.len() * std::mem::size_of::<f32>()
    }

    /// Returns the bit depth of the source file.
    pub fn source_bits(&self) -> u16 {
        self.source_bits
    }

    /// Returns the sample rate of the source file.
    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }
}

/// A cached sample with its recency stamp.
struct CacheEntry {
    buffer: Arc<SampleBuffer>,
    last_used: u64,
}

/// Loads and caches samples.
///
/// The store is only ever used from the startup/control context. Cache
/// mutation never happens concurrently with playback of an affected entry:
/// buffers still referenced outside the store are exempt from eviction.
pub struct SampleStore {
    /// Cached samples keyed by resolved file path.
    cache: HashMap<PathBuf, CacheEntry>,
    /// Ceiling for total resident bytes.
    max_bytes: usize,
    /// Monotonic counter backing LRU ordering.
    use_counter: u64,
    /// The next id to assign.
    next_id: u32,
}

impl SampleStore {
    /// Creates a store with the given byte ceiling.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            cache: HashMap::new(),
            max_bytes,
            use_counter: 0,
            next_id: 0,
        }
    }

    /// Loads a sample from a file, returning the cached buffer when the same
    /// resolved path was loaded before.
    pub fn load(&mut self, path: &Path) -> Result<Arc<SampleBuffer>, SampleError> {
        let resolved = path.canonicalize()?;

        self.use_counter += 1;
        if let Some(entry) = self.cache.get_mut(&resolved) {
            entry.last_used = self.use_counter;
            debug!(path = ?resolved, "Using cached sample");
            return Ok(entry.buffer.clone());
        }

        let decoded = decode_wav(&resolved, OUTPUT_SAMPLE_RATE)?;

        let id = SampleId(self.next_id);
        self.next_id += 1;
        let buffer = Arc::new(SampleBuffer::from_frames(
            id,
            decoded.frames,
            decoded.source_bits,
            decoded.source_rate,
        ));

        self.make_room_for(buffer.memory_size());

        info!(
            path = ?resolved,
            source_bits = buffer.source_bits(),
            source_rate = buffer.source_rate(),
            frames = buffer.frame_count(),
            duration_ms = buffer.duration().as_millis(),
            memory_kb = buffer.memory_size() / 1024,
            "Sample loaded"
        );

        self.cache.insert(
            resolved,
            CacheEntry {
                buffer: buffer.clone(),
                last_used: self.use_counter,
            },
        );

        Ok(buffer)
    }

    /// Explicitly evicts a cached sample. Returns false if the path is not
    /// cached or its buffer is still referenced outside the store.
    pub fn evict(&mut self, path: &Path) -> bool {
        let resolved = match path.canonicalize() {
            Ok(resolved) => resolved,
            Err(_) => return false,
        };
        match self.cache.get(&resolved) {
            Some(entry) if Arc::strong_count(&entry.buffer) == 1 => {
                self.cache.remove(&resolved);
                true
            }
            _ => false,
        }
    }

    /// Builds the read-only table handed to the mixing engine, indexed by
    /// `SampleId`. Entries for evicted samples are `None`.
    pub fn sample_table(&self) -> SampleTable {
        let mut table: SampleTable = vec![None; self.next_id as usize];
        for entry in self.cache.values() {
            table[entry.buffer.id().index()] = Some(entry.buffer.clone());
        }
        table
    }

    /// Returns the total resident bytes of all cached samples.
    pub fn cached_bytes(&self) -> usize {
        self.cache.values().map(|e| e.buffer.memory_size()).sum()
    }

    /// Returns the number of cached samples.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Evicts least-recently-used unreferenced entries until `incoming` more
    /// bytes fit under the ceiling. Entries whose buffers are referenced
    /// outside the store are never touched; if nothing can be evicted the
    /// cache is allowed to overflow with a warning.
    fn make_room_for(&mut self, incoming: usize) {
        while self.cached_bytes() + incoming > self.max_bytes {
            let candidate = self
                .cache
                .iter()
                .filter(|(_, entry)| Arc::strong_count(&entry.buffer) == 1)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(path, _)| path.clone());

            match candidate {
                Some(path) => {
                    let entry = self.cache.remove(&path).expect("candidate came from cache");
                    debug!(
                        path = ?path,
                        freed_kb = entry.buffer.memory_size() / 1024,
                        "Evicted sample from cache"
                    );
                }
                None => {
                    warn!(
                        cached_kb = self.cached_bytes() / 1024,
                        max_kb = self.max_bytes / 1024,
                        "Sample cache over ceiling but all entries are in use"
                    );
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleStore")
            .field("cached_samples", &self.cache.len())
            .field("cached_kb", &(self.cached_bytes() / 1024))
            .field("max_kb", &(self.max_bytes / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_second_load_is_a_cache_hit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kick.wav");
        write_wav(&path, 16, 2, 44100, &[0.5; 1000]);

        let mut store = SampleStore::new(DEFAULT_CACHE_BYTES);
        let first = store.load(&path).expect("load");
        let second = store.load(&path).expect("load");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn test_eviction_prefers_least_recently_used() {
        let dir = tempfile::tempdir().expect("tempdir");
        let samples = vec![0.25f32; 11025 * 2]; // ~88KB decoded

        for name in ["a.wav", "b.wav", "c.wav"] {
            write_wav(&dir.path().join(name), 16, 2, 44100, &samples);
        }

        // Ceiling fits two decoded buffers but not three.
        let one = samples.len() * std::mem::size_of::<f32>();
        let mut store = SampleStore::new(one * 2 + one / 2);

        let a = store.load(&dir.path().join("a.wav")).expect("load a");
        let b = store.load(&dir.path().join("b.wav")).expect("load b");

        // Touch a so b becomes the LRU entry, then drop all outside refs.
        store.load(&dir.path().join("a.wav")).expect("reload a");
        drop(a);
        drop(b);

        store.load(&dir.path().join("c.wav")).expect("load c");

        assert_eq!(store.len(), 2);
        assert!(store.cached_bytes() <= one * 2 + one / 2);

        // a survived; b was evicted; reloading b decodes fresh with a new id.
        let table = store.sample_table();
        assert_eq!(table.iter().filter(|e| e.is_some()).count(), 2);
        assert!(table[1].is_none(), "b should have been evicted");
    }

    #[test]
    fn test_referenced_entries_are_never_evicted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let samples = vec![0.25f32; 11025 * 2];

        for name in ["a.wav", "b.wav"] {
            write_wav(&dir.path().join(name), 16, 2, 44100, &samples);
        }

        let one = samples.len() * std::mem::size_of::<f32>();
        let mut store = SampleStore::new(one + one / 2);

        // Hold the reference, as a live voice would.
        let _held = store.load(&dir.path().join("a.wav")).expect("load a");
        store.load(&dir.path().join("b.wav")).expect("load b");

        // a could not be evicted even though the ceiling is exceeded.
        assert_eq!(store.len(), 2);
        assert!(store.cached_bytes() > one + one / 2);
    }

    #[test]
    fn test_explicit_evict() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snare.wav");
        write_wav(&path, 16, 2, 44100, &[0.5; 1000]);

        let mut store = SampleStore::new(DEFAULT_CACHE_BYTES);
        let buffer = store.load(&path).expect("load");

        // Referenced: refused.
        assert!(!store.evict(&path));
        drop(buffer);
        assert!(store.evict(&path));
        assert!(store.is_empty());
    }

    #[test]
    fn test_sample_table_indexed_by_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a.wav", "b.wav"] {
            write_wav(&dir.path().join(name), 16, 2, 44100, &[0.5; 100]);
        }

        let mut store = SampleStore::new(DEFAULT_CACHE_BYTES);
        let a = store.load(&dir.path().join("a.wav")).expect("load a");
        let b = store.load(&dir.path().join("b.wav")).expect("load b");

        let table = store.sample_table();
        assert_eq!(table.len(), 2);
        assert!(Arc::ptr_eq(table[a.id().index()].as_ref().expect("a"), &a));
        assert!(Arc::ptr_eq(table[b.id().index()].as_ref().expect("b"), &b));
    }
}
