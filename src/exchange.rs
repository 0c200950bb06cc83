//! Chunked content exchange.
//!
//! Streams two files through two fixed-size buffers, swaps the buffers' bytes
//! in place with the three-XOR trick, and writes the result into two new
//! sibling files (`<name>.xmv-swap`). The inputs are only ever read; committing
//! the outputs over (or instead of) the originals is the caller's job.
//!
//! Files of different length are handled per chunk: the shorter buffer is
//! zero-padded in memory for the XOR step, and each output receives exactly as
//! many bytes as the *other* input supplied for that chunk, so padding never
//! reaches the disk.
//!
//! Extra disk usage while running is the two outputs; memory is two chunks.
//!
//! Concurrent modification of either input while an exchange runs is not
//! detected and yields undefined output.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace};

use crate::errors::XmvError;

/// Suffix of the sibling output produced for each input.
pub const EXCHANGE_SUFFIX: &str = ".xmv-swap";

/// Chunk size for routine use.
pub const CHUNK_SIZE_FAST: usize = 4 * 1024;

/// Chunk size selected by `--secure`.
pub const CHUNK_SIZE_SECURE: usize = 1024 * 1024;

/// Chunk-size preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkMode {
    #[default]
    Fast,
    Secure,
}

impl ChunkMode {
    pub fn bytes(self) -> usize {
        match self {
            ChunkMode::Fast => CHUNK_SIZE_FAST,
            ChunkMode::Secure => CHUNK_SIZE_SECURE,
        }
    }
}

impl fmt::Display for ChunkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkMode::Fast => f.write_str("fast"),
            ChunkMode::Secure => f.write_str("secure"),
        }
    }
}

impl FromStr for ChunkMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ChunkMode::Fast),
            "secure" => Ok(ChunkMode::Secure),
            other => Err(format!("invalid chunk mode: '{other}' (expected fast or secure)")),
        }
    }
}

/// Per-chunk progress report handed to the caller's observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// 1-based index of the chunk just written.
    pub chunk: u64,
    /// Bytes consumed so far from the longer input.
    pub bytes_done: u64,
    /// Length of the longer input at the start of the exchange.
    pub bytes_total: u64,
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    /// Sibling of the first input; holds the second input's bytes.
    pub output_a: PathBuf,
    /// Sibling of the second input; holds the first input's bytes.
    pub output_b: PathBuf,
    /// Bytes written to `output_a` and `output_b`.
    pub bytes_written: (u64, u64),
    pub chunks: u64,
}

/// `<path>.xmv-swap`
pub fn sibling_output(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(EXCHANGE_SUFFIX);
    PathBuf::from(name)
}

/// Swap `a[..n]` and `b[..n]` in place, `n` being the shorter length.
pub fn xor_swap_in_place(a: &mut [u8], b: &mut [u8]) {
    for (x, y) in a.iter_mut().zip(b.iter_mut()) {
        let t = *x ^ *y;
        *x ^= t;
        *y ^= t;
    }
}

/// Read until `buf` is full or the reader is exhausted. Returns bytes read.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn create_output(path: &Path, chunk_size: usize) -> Result<BufWriter<File>, XmvError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(XmvError::io("create exchange output", path))?;
    Ok(BufWriter::with_capacity(chunk_size, file))
}

fn finish_output(writer: BufWriter<File>, path: &Path) -> Result<(), XmvError> {
    let file = writer
        .into_inner()
        .map_err(|e| XmvError::Io {
            step: "flush exchange output",
            path: path.to_path_buf(),
            source: e.into_error(),
        })?;
    file.sync_all()
        .map_err(XmvError::io("sync exchange output", path))
}

/// Exchange the contents of `file_a` and `file_b` into their sibling outputs.
pub fn exchange(file_a: &Path, file_b: &Path, chunk_size: usize) -> Result<ExchangeResult, XmvError> {
    exchange_observed(file_a, file_b, chunk_size, &mut |_| {})
}

/// Like [`exchange`], calling `observer` after every chunk.
///
/// On error the partially written outputs are left on disk; the orchestrator
/// removes them as part of its rollback.
pub fn exchange_observed(
    file_a: &Path,
    file_b: &Path,
    chunk_size: usize,
    observer: &mut dyn FnMut(ChunkProgress),
) -> Result<ExchangeResult, XmvError> {
    let chunk_size = chunk_size.max(1);
    let output_a = sibling_output(file_a);
    let output_b = sibling_output(file_b);

    let mut in_a = File::open(file_a).map_err(XmvError::io("open input", file_a))?;
    let mut in_b = File::open(file_b).map_err(XmvError::io("open input", file_b))?;
    let len_a = in_a.metadata().map(|m| m.len()).unwrap_or(0);
    let len_b = in_b.metadata().map(|m| m.len()).unwrap_or(0);
    let bytes_total = len_a.max(len_b);

    let mut out_a = create_output(&output_a, chunk_size)?;
    let mut out_b = create_output(&output_b, chunk_size)?;

    debug!(
        a = %file_a.display(),
        b = %file_b.display(),
        len_a,
        len_b,
        chunk_size,
        "starting content exchange"
    );

    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];
    let mut written = (0u64, 0u64);
    let mut chunks = 0u64;

    loop {
        let count_a = read_chunk(&mut in_a, &mut buf_a).map_err(XmvError::io("read input", file_a))?;
        let count_b = read_chunk(&mut in_b, &mut buf_b).map_err(XmvError::io("read input", file_b))?;

        if count_a == 0 && count_b == 0 {
            break;
        }

        // Pad the shorter side so the XOR step sees zeros, not stale bytes.
        let max_count = count_a.max(count_b);
        buf_a[count_a..max_count].fill(0);
        buf_b[count_b..max_count].fill(0);

        xor_swap_in_place(&mut buf_a[..max_count], &mut buf_b[..max_count]);

        // buf_a now holds B's bytes (count_b of them) and vice versa.
        out_a
            .write_all(&buf_a[..count_b])
            .map_err(XmvError::io("write exchange output", &output_a))?;
        out_b
            .write_all(&buf_b[..count_a])
            .map_err(XmvError::io("write exchange output", &output_b))?;

        written.0 += count_b as u64;
        written.1 += count_a as u64;
        chunks += 1;

        let progress = ChunkProgress {
            chunk: chunks,
            bytes_done: written.0.max(written.1),
            bytes_total,
        };
        trace!(chunk = chunks, count_a, count_b, "chunk exchanged");
        observer(progress);
    }

    finish_output(out_a, &output_a)?;
    finish_output(out_b, &output_b)?;
    drop(in_a);
    drop(in_b);

    debug!(
        output_a = %output_a.display(),
        output_b = %output_b.display(),
        bytes_a = written.0,
        bytes_b = written.1,
        chunks,
        "content exchange finished"
    );

    Ok(ExchangeResult {
        output_a,
        output_b,
        bytes_written: written,
        chunks,
    })
}
