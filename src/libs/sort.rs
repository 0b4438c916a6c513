//! External coordinate sort for tab-delimited variant files.
//!
//! # Algorithm
//!
//! 1. **Header**: every line before the first non-`#` line is kept verbatim.
//! 2. **Chunk phase**: read up to `chunk_size` data lines, parse only
//!    chromosome and position, stable-sort, spill to a scratch file.
//! 3. **Merge phase**: k-way merge of the scratch files, either by scanning
//!    the head of every chunk or with a binary heap. Equal keys are taken
//!    from the lower chunk index first, so the output does not depend on the
//!    chunk size or the strategy.
//!
//! All scratch files live in one [`TempDir`] that is removed on every exit
//! path, and the output is staged so that a failed sort leaves no file behind.

use crate::libs::coord::{chrom_key, ChromKey};
use crate::libs::error::VcfError;
use crate::libs::io::{reader, StagedOutput};
use crate::libs::record::Locus;
use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Default number of data lines held in memory per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Buffer size for reading scratch files during merge.
const MERGE_BUFFER_SIZE: usize = 64 * 1024;

type Key = (ChromKey, u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Compare the head line of every open chunk for each emitted line.
    #[default]
    Scan,
    /// Keep chunk heads in a binary heap.
    Heap,
}

#[derive(Debug, Clone)]
pub struct SortConfig {
    chunk_size: usize,
    tmp_dir: Option<PathBuf>,
    strategy: MergeStrategy,
    threads: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SortConfig {
    #[must_use]
    pub fn new() -> Self {
        SortConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            tmp_dir: None,
            strategy: MergeStrategy::Scan,
            threads: 1,
        }
    }

    /// Maximum number of data lines resident at once.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Parent directory for the scratch directory.
    #[must_use]
    pub fn tmp_dir(mut self, path: PathBuf) -> Self {
        self.tmp_dir = Some(path);
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Threads used to sort each chunk; 1 sorts on the calling thread.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    fn create_scratch(&self) -> Result<TempDir> {
        let parent = self.tmp_dir.clone().unwrap_or_else(std::env::temp_dir);
        tempfile::Builder::new()
            .prefix("vcftk_sort_")
            .tempdir_in(&parent)
            .with_context(|| format!("could not create scratch dir in {}", parent.display()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Data lines written to the output
    pub records: u64,
    /// Blank, comment or malformed lines dropped from the body
    pub skipped: u64,
    /// Scratch files produced
    pub chunks: usize,
}

/// A raw data line with its precomputed sort key.
struct KeyedLine {
    key: Key,
    line: Vec<u8>,
}

fn line_key(line: &[u8]) -> Option<Key> {
    let locus = Locus::from_bytes(line)?;
    Some((chrom_key(locus.chrom), locus.pos))
}

fn next_line<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Splits the leading header lines off `reader`.
///
/// Returns the header lines (terminators kept) and the first body line, if
/// any, which has already been consumed from the reader. Lines are kept as
/// bytes and never decoded.
pub fn read_header_lines<R: BufRead>(
    reader: &mut R,
) -> io::Result<(Vec<Vec<u8>>, Option<Vec<u8>>)> {
    let mut header = Vec::new();
    loop {
        let Some(line) = next_line(reader)? else {
            return Ok((header, None));
        };
        if line.starts_with(b"#") {
            header.push(line);
        } else {
            return Ok((header, Some(line)));
        }
    }
}

/// Splits a body into sorted scratch files of at most `chunk_size` lines.
pub struct ChunkedSorter<'a> {
    chunk_size: usize,
    scratch: &'a Path,
    pool: Option<rayon::ThreadPool>,
    chunk_files: Vec<PathBuf>,
    stats: SortStats,
}

impl<'a> ChunkedSorter<'a> {
    pub fn new(config: &SortConfig, scratch: &'a Path) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(VcfError::InvalidChunkSize.into());
        }
        let pool = if config.threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.threads)
                    .build()?,
            )
        } else {
            None
        };

        Ok(ChunkedSorter {
            chunk_size: config.chunk_size,
            scratch,
            pool,
            chunk_files: Vec::new(),
            stats: SortStats::default(),
        })
    }

    /// Consumes every remaining line of `reader`, starting with `first`.
    pub fn run<R: BufRead>(
        mut self,
        first: Option<Vec<u8>>,
        reader: &mut R,
    ) -> Result<(Vec<PathBuf>, SortStats)> {
        let mut chunk: Vec<KeyedLine> = Vec::with_capacity(self.chunk_size.min(DEFAULT_CHUNK_SIZE));

        if let Some(line) = first {
            self.push(&mut chunk, line)?;
        }
        while let Some(line) = next_line(reader).context("failed to read input")? {
            self.push(&mut chunk, line)?;
        }
        if !chunk.is_empty() {
            self.spill(&mut chunk)?;
        }

        self.stats.chunks = self.chunk_files.len();
        Ok((self.chunk_files, self.stats))
    }

    fn push(&mut self, chunk: &mut Vec<KeyedLine>, mut line: Vec<u8>) -> Result<()> {
        if line.starts_with(b"#") {
            self.stats.skipped += 1;
            return Ok(());
        }
        let Some(key) = line_key(&line) else {
            self.stats.skipped += 1;
            return Ok(());
        };
        if !line.ends_with(b"\n") {
            line.push(b'\n');
        }

        chunk.push(KeyedLine { key, line });
        self.stats.records += 1;
        if chunk.len() >= self.chunk_size {
            self.spill(chunk)?;
        }
        Ok(())
    }

    fn spill(&mut self, chunk: &mut Vec<KeyedLine>) -> Result<()> {
        // both sorts are stable: equal keys keep input order
        match &self.pool {
            Some(pool) => pool.install(|| chunk.par_sort_by(|a, b| a.key.cmp(&b.key))),
            None => chunk.sort_by(|a, b| a.key.cmp(&b.key)),
        }

        let path = self
            .scratch
            .join(format!("chunk_{:04}.tmp", self.chunk_files.len()));
        write_chunk(chunk, &path).with_context(|| format!("failed to write {}", path.display()))?;
        debug!("Saved chunk of {} lines in {}", chunk.len(), path.display());

        self.chunk_files.push(path);
        chunk.clear();
        Ok(())
    }
}

fn write_chunk(chunk: &[KeyedLine], path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in chunk {
        writer.write_all(&item.line)?;
    }
    writer.flush()
}

/// Reading position inside one sorted scratch file.
struct ChunkCursor {
    reader: BufReader<File>,
    head: Option<KeyedLine>,
    idx: usize,
}

impl ChunkCursor {
    fn open(path: &Path, idx: usize) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut cursor = ChunkCursor {
            reader: BufReader::with_capacity(MERGE_BUFFER_SIZE, file),
            head: None,
            idx,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// Replaces the head with the next keyed line, or `None` at the end.
    fn advance(&mut self) -> io::Result<()> {
        self.head = None;
        while let Some(line) = next_line(&mut self.reader)? {
            if let Some(key) = line_key(&line) {
                self.head = Some(KeyedLine { key, line });
                break;
            }
        }
        Ok(())
    }
}

struct HeapEntry {
    key: Key,
    idx: usize,
    line: Vec<u8>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

/// Merges sorted scratch files into `writer`, returning the lines written.
pub fn merge_chunks<W: Write>(
    chunk_files: &[PathBuf],
    writer: &mut W,
    strategy: MergeStrategy,
) -> Result<u64> {
    let mut cursors = chunk_files
        .iter()
        .enumerate()
        .map(|(idx, path)| ChunkCursor::open(path, idx))
        .collect::<Result<Vec<_>>>()?;

    let written = match strategy {
        MergeStrategy::Scan => merge_by_scan(&mut cursors, writer)?,
        MergeStrategy::Heap => merge_by_heap(&mut cursors, writer)?,
    };
    Ok(written)
}

fn merge_by_scan<W: Write>(cursors: &mut [ChunkCursor], writer: &mut W) -> io::Result<u64> {
    let mut written = 0;
    loop {
        let mut min: Option<(usize, Key)> = None;
        for (i, cursor) in cursors.iter().enumerate() {
            if let Some(head) = &cursor.head {
                // strict less: the earlier chunk wins ties
                if min.map_or(true, |(_, key)| head.key < key) {
                    min = Some((i, head.key));
                }
            }
        }

        let Some((i, _)) = min else {
            break;
        };
        if let Some(head) = cursors[i].head.take() {
            writer.write_all(&head.line)?;
            written += 1;
        }
        cursors[i].advance()?;
    }
    Ok(written)
}

fn merge_by_heap<W: Write>(cursors: &mut [ChunkCursor], writer: &mut W) -> io::Result<u64> {
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::with_capacity(cursors.len());
    for cursor in cursors.iter_mut() {
        if let Some(head) = cursor.head.take() {
            heap.push(Reverse(HeapEntry {
                key: head.key,
                idx: cursor.idx,
                line: head.line,
            }));
        }
    }

    let mut written = 0;
    while let Some(Reverse(entry)) = heap.pop() {
        writer.write_all(&entry.line)?;
        written += 1;

        let cursor = &mut cursors[entry.idx];
        cursor.advance()?;
        if let Some(head) = cursor.head.take() {
            heap.push(Reverse(HeapEntry {
                key: head.key,
                idx: cursor.idx,
                line: head.line,
            }));
        }
    }
    Ok(written)
}

/// Sorts `input` into `output` by chromosome key and position.
///
/// `input` may be `stdin` or a (gzipped) file; `output` may be `stdout`, a
/// plain file, or a `.gz` file.
pub fn sort_file(input: &str, output: &str, config: &SortConfig) -> Result<SortStats> {
    if input != "stdin" && !Path::new(input).exists() {
        return Err(VcfError::InputNotFound(PathBuf::from(input)).into());
    }
    if config.chunk_size == 0 {
        return Err(VcfError::InvalidChunkSize.into());
    }

    info!("Sorting {} with chunk size {}", input, config.chunk_size);

    let scratch = config.create_scratch()?;
    debug!("Scratch dir: {}", scratch.path().display());

    let stats = sort_with_scratch(input, output, config, scratch.path())?;

    scratch
        .close()
        .context("failed to remove scratch directory")?;
    info!(
        "Sort complete: {} records in {} chunks, {} lines skipped",
        stats.records, stats.chunks, stats.skipped
    );
    Ok(stats)
}

fn sort_with_scratch(
    input: &str,
    output: &str,
    config: &SortConfig,
    scratch: &Path,
) -> Result<SortStats> {
    let mut reader = reader(input)?;
    let (header, first) = read_header_lines(&mut reader).context("failed to read header")?;

    info!("Phase 1: Reading and sorting chunks...");
    let (chunk_files, stats) = ChunkedSorter::new(config, scratch)?.run(first, &mut reader)?;

    let mut out = StagedOutput::create(output)?;
    for line in &header {
        out.write_all(line)?;
    }

    if chunk_files.len() == 1 {
        debug!("Single chunk, copying it to the output");
        let mut chunk = File::open(&chunk_files[0])?;
        io::copy(&mut chunk, &mut out).context("failed to copy chunk")?;
    } else if !chunk_files.is_empty() {
        info!(
            "Phase 2: Merging {} chunks ({:?})...",
            chunk_files.len(),
            config.strategy
        );
        merge_chunks(&chunk_files, &mut out, config.strategy)?;
    }

    out.finish()?;
    Ok(stats)
}
