//! Writers that sit between a hook's stdio pipes and their destinations.
//!
//! ```text
//! child stdout ──► TeeWriter ───────► captured buffer
//!                      ├────────────► caller's writer (optional)
//!                      └────────────► DebugWriter (tracing)
//!
//! child stdout ──► BoundariedWriter ─► payload (between boundaries)
//!                      ├────────────► caller's writer (text outside the payload)
//!                      └────────────► DebugWriter (raw)
//! ```

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Target used for the streamed output of hook processes.
pub const HOOK_LOG_TARGET: &str = "sdk_hooks::hook";

/// A caller-supplied writer borrowed for the duration of one execution.
pub type StreamWriter<'a> = &'a mut (dyn Write + Send + 'a);

/// Reborrow an optional caller writer for a shorter lifetime.
pub(crate) fn reborrow<'s>(writer: &'s mut Option<StreamWriter<'_>>) -> Option<StreamWriter<'s>> {
    match writer {
        Some(w) => {
            let w: StreamWriter<'s> = &mut **w;
            Some(w)
        }
        None => None,
    }
}

// ─── IoStreams ────────────────────────────────────────────────────────────

/// The executor's own primary output, where the `Start` hook's
/// human-readable lines are written.
#[derive(Clone)]
pub struct IoStreams {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl IoStreams {
    /// Write to the process's stdout.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn write_out(&self, bytes: &[u8]) -> io::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("output stream lock poisoned"))?;
        out.write_all(bytes)?;
        out.flush()
    }
}

impl Default for IoStreams {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for IoStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoStreams").finish_non_exhaustive()
    }
}

/// A cloneable in-memory writer. Every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.inner
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("shared buffer lock poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── DebugWriter ──────────────────────────────────────────────────────────

/// Forwards every non-empty line written to it as a `debug` event.
///
/// An unterminated last line is held until its newline arrives or the writer
/// is dropped.
#[derive(Debug)]
pub(crate) struct DebugWriter {
    hook: String,
    stream: &'static str,
    partial: Vec<u8>,
}

impl DebugWriter {
    pub(crate) fn new(hook: &str, stream: &'static str) -> Self {
        Self {
            hook: hook.to_string(),
            stream,
            partial: Vec::new(),
        }
    }

    fn log(&self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        for line in text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
            tracing::debug!(
                target: HOOK_LOG_TARGET,
                hook = %self.hook,
                stream = self.stream,
                "{line}"
            );
        }
    }
}

impl Write for DebugWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !tracing::enabled!(target: HOOK_LOG_TARGET, tracing::Level::DEBUG) {
            return Ok(buf.len());
        }
        self.partial.extend_from_slice(buf);
        if let Some(end) = self.partial.iter().rposition(|&b| b == b'\n') {
            let complete: Vec<u8> = self.partial.drain(..=end).collect();
            self.log(&complete);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for DebugWriter {
    fn drop(&mut self) {
        let rest = std::mem::take(&mut self.partial);
        self.log(&rest);
    }
}

// ─── TeeWriter ────────────────────────────────────────────────────────────

/// Captures everything written while forwarding it to an optional caller
/// writer and to the debug log.
pub(crate) struct TeeWriter<'a> {
    captured: Vec<u8>,
    stream: Option<StreamWriter<'a>>,
    debug: DebugWriter,
}

impl<'a> TeeWriter<'a> {
    pub(crate) fn new(stream: Option<StreamWriter<'a>>, debug: DebugWriter) -> Self {
        Self {
            captured: Vec::new(),
            stream,
            debug,
        }
    }

    pub(crate) fn captured(&self) -> String {
        String::from_utf8_lossy(&self.captured).into_owned()
    }
}

impl Write for TeeWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(stream) = self.stream.as_mut() {
            stream.write_all(buf)?;
        }
        self.captured.extend_from_slice(buf);
        self.debug.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

// ─── FilteredWriter ───────────────────────────────────────────────────────

/// Strips boundary tokens before forwarding.
///
/// A trailing prefix of the token is held back until the next write shows
/// whether it completes the token; [`FilteredWriter::finish`] releases it.
pub(crate) struct FilteredWriter<'a> {
    boundary: Vec<u8>,
    pending: Vec<u8>,
    stream: Option<StreamWriter<'a>>,
}

impl<'a> FilteredWriter<'a> {
    pub(crate) fn new(boundary: &str, stream: Option<StreamWriter<'a>>) -> Self {
        Self {
            boundary: boundary.as_bytes().to_vec(),
            pending: Vec::new(),
            stream,
        }
    }

    /// Forward whatever is still held back.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        let rest = std::mem::take(&mut self.pending);
        forward(&mut self.stream, &rest)
    }
}

impl Write for FilteredWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(buf.len());
        };
        if self.boundary.is_empty() {
            stream.write_all(buf)?;
            return Ok(buf.len());
        }
        self.pending.extend_from_slice(buf);
        while let Some(i) = find(&self.pending, &self.boundary) {
            stream.write_all(&self.pending[..i])?;
            self.pending.drain(..i + self.boundary.len());
        }
        let ready = self.pending.len() - prefix_suffix_len(&self.pending, &self.boundary);
        stream.write_all(&self.pending[..ready])?;
        self.pending.drain(..ready);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

// ─── BoundaryScanner ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No boundary seen yet.
    Before,
    /// Between the first and second boundary.
    Inside,
    /// Second boundary seen; the payload is complete.
    After,
}

/// Incremental extractor for the bytes between the first two occurrences of
/// a boundary token.
///
/// Holds back at most `boundary.len() - 1` bytes between chunks so a token
/// split across two writes is still found. Everything outside the payload is
/// handed to the `emit` callback with the tokens removed.
#[derive(Debug)]
pub(crate) struct BoundaryScanner {
    boundary: Vec<u8>,
    state: ScanState,
    pending: Vec<u8>,
    payload: Vec<u8>,
}

impl BoundaryScanner {
    pub(crate) fn new(boundary: &str) -> Self {
        Self {
            boundary: boundary.as_bytes().to_vec(),
            state: ScanState::Before,
            pending: Vec::new(),
            payload: Vec::new(),
        }
    }

    pub(crate) fn feed<F>(&mut self, chunk: &[u8], mut emit: F) -> io::Result<()>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        if self.boundary.is_empty() {
            return emit(chunk);
        }
        self.pending.extend_from_slice(chunk);

        while let Some(i) = find(&self.pending, &self.boundary) {
            let head: Vec<u8> = self.pending.drain(..i).collect();
            self.pending.drain(..self.boundary.len());
            match self.state {
                ScanState::Before => {
                    emit(&head)?;
                    self.state = ScanState::Inside;
                }
                ScanState::Inside => {
                    self.payload.extend_from_slice(&head);
                    self.state = ScanState::After;
                }
                ScanState::After => emit(&head)?,
            }
        }

        let keep = (self.boundary.len() - 1).min(self.pending.len());
        let ready: Vec<u8> = self.pending.drain(..self.pending.len() - keep).collect();
        match self.state {
            ScanState::Inside => self.payload.extend_from_slice(&ready),
            ScanState::Before | ScanState::After => emit(&ready)?,
        }
        Ok(())
    }

    /// Flush held-back bytes and return the payload.
    ///
    /// Without both boundaries the payload is empty. Bytes after an
    /// unterminated opening boundary are not a payload and go to `emit`.
    pub(crate) fn finish<F>(&mut self, mut emit: F) -> io::Result<Vec<u8>>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        let rest = std::mem::take(&mut self.pending);
        let payload = std::mem::take(&mut self.payload);
        match self.state {
            ScanState::After => {
                emit(&rest)?;
                Ok(payload)
            }
            ScanState::Inside => {
                emit(&payload)?;
                emit(&rest)?;
                Ok(Vec::new())
            }
            ScanState::Before => {
                emit(&rest)?;
                Ok(Vec::new())
            }
        }
    }
}

// ─── BoundariedWriter ─────────────────────────────────────────────────────

/// stdout sink for the message-boundary protocol.
pub(crate) struct BoundariedWriter<'a> {
    scanner: BoundaryScanner,
    stream: Option<StreamWriter<'a>>,
    debug: DebugWriter,
}

impl<'a> BoundariedWriter<'a> {
    pub(crate) fn new(boundary: &str, stream: Option<StreamWriter<'a>>, debug: DebugWriter) -> Self {
        Self {
            scanner: BoundaryScanner::new(boundary),
            stream,
            debug,
        }
    }

    /// The payload between the boundaries, empty when framing was malformed.
    pub(crate) fn finish(&mut self) -> io::Result<String> {
        let stream = &mut self.stream;
        let payload = self.scanner.finish(|bytes| forward(stream, bytes))?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }
}

impl Write for BoundariedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.debug.write_all(buf)?;
        let stream = &mut self.stream;
        self.scanner.feed(buf, |bytes| forward(stream, bytes))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

fn forward(stream: &mut Option<StreamWriter<'_>>, bytes: &[u8]) -> io::Result<()> {
    match stream {
        Some(w) if !bytes.is_empty() => w.write_all(bytes),
        _ => Ok(()),
    }
}

/// Length of the longest proper prefix of `needle` that `haystack` ends with.
fn prefix_suffix_len(haystack: &[u8], needle: &[u8]) -> usize {
    let max = needle.len().saturating_sub(1).min(haystack.len());
    (1..=max)
        .rev()
        .find(|&k| haystack.ends_with(&needle[..k]))
        .unwrap_or(0)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
