//! A probe target over a seek-counting stream.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::operation::Operation;
use crate::stream::{SeekStream, SharedStream};
use crate::target::LazyTarget;

/// In-memory stream that counts absolute moves.
///
/// `stream_position` is answered without a seek so that position
/// queries don't show up in the count. Faults can be armed on a given
/// seek or on every position query.
pub struct Tracked {
    inner: Cursor<Vec<u8>>,
    pub seeks: usize,
    fail_on_seek: Option<usize>,
    pub fail_position: bool,
}

impl Tracked {
    /// Make the `n`th seek from now fail without moving the cursor.
    pub fn fail_nth_seek(&mut self, n: usize) {
        self.fail_on_seek = Some(self.seeks + n);
    }
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for Tracked {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks += 1;
        if self.fail_on_seek == Some(self.seeks) {
            return Err(io::Error::other("injected seek failure"));
        }
        self.inner.seek(pos)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        if self.fail_position {
            return Err(io::Error::other("injected tell failure"));
        }
        Ok(self.inner.position())
    }
}

/// A `len`-byte stream whose byte at offset `i` is `i as u8`, already
/// positioned at `at`.
pub fn tracked(len: usize, at: u64) -> SharedStream<Tracked> {
    #[allow(clippy::cast_possible_truncation)]
    let data = (0..len).map(|i| i as u8).collect();
    let mut inner = Cursor::new(data);
    inner.set_position(at);
    SharedStream::new(Tracked {
        inner,
        seeks: 0,
        fail_on_seek: None,
        fail_position: false,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("injected failure")]
    Injected,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// `skip(n)` sets the cheap fields and seeks `n` bytes forward.
/// `parse(n)` reads `n` bytes from where it is invoked.
/// `fail` writes partial state, wanders off, then errors.
#[derive(Debug, Default)]
pub struct Probe {
    pub width: u32,
    pub pixels: Vec<u8>,
    pub loads: usize,
    pub load_offsets: Vec<u64>,
}

impl<R: Read + SeekStream> LazyTarget<R> for Probe {
    type Error = ProbeError;

    const OPERATIONS: &'static [&'static str] = &["skip", "parse", "fail"];

    fn invoke(&mut self, op: &Operation, stream: &mut R) -> Result<(), ProbeError> {
        match op.name() {
            "skip" => {
                self.width = 640;
                let here = stream.current_position()?;
                stream.seek_to(here + op.u64_arg(0).unwrap_or(0))?;
            }
            "parse" => {
                self.loads += 1;
                self.load_offsets.push(stream.current_position()?);
                let len = usize::try_from(op.u64_arg(0).unwrap_or(0)).unwrap_or(0);
                let mut buf = vec![0u8; len];
                stream.read_exact(&mut buf)?;
                self.pixels = buf;
            }
            _ => {
                self.loads += 1;
                self.pixels = vec![0xEE];
                stream.seek_to(9999)?;
                return Err(ProbeError::Injected);
            }
        }
        Ok(())
    }
}
