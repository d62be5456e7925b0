//! Compact spill codec used by external sorting.
//!
//! The format is closed and versionless: a stream is only ever read back by
//! the process that wrote it. Every value starts with its signed tag byte,
//! followed by a tag-specific body:
//!
//! | Tag | Body |
//! |-----|------|
//! | missing, null, undefined, min/max key | none |
//! | int, long, double, date, timestamp | little-endian, fixed width |
//! | bool | one byte |
//! | object id | 12 bytes |
//! | decimal | low 64 bits, high 64 bits |
//! | string, symbol, code | i32 length, bytes |
//! | binary | subtype byte, i32 length, bytes |
//! | regex | pattern NUL, flags NUL |
//! | db ref | 12 id bytes, namespace NUL |
//! | code with scope | i32 length, code bytes, scope document |
//! | array | i32 count, elements |
//! | document | i32 count, `name NUL value` pairs |
//!
//! Decoding reproduces the exact tag and payload. Numeric kinds are never
//! unified here, unlike in comparison.

use bytes::{BufMut, Bytes, BytesMut};
use docvalue_foundation::{
    Date, Decimal128, Document, Error, ErrorContext, ErrorKind, ObjectId, Result, Timestamp,
    TypeTag, Value,
};
use tracing::{debug, trace};

use crate::config::SpillConfig;
use crate::partial::{self, Kind, Partial};

/// Values that can be written to and restored from a spill stream.
pub trait SorterSerializable: Sized {
    /// Appends this value's encoding.
    ///
    /// # Errors
    ///
    /// Fails if a payload is too long for its 32-bit length prefix.
    fn serialize_for_sorter(&self, writer: &mut SpillWriter) -> Result<()>;

    /// Reads one value, advancing the reader past it.
    ///
    /// # Errors
    ///
    /// Fails on truncated or corrupt input, or on nesting deeper than
    /// `config.max_depth()`.
    fn deserialize_for_sorter(reader: &mut SpillReader<'_>, config: &SpillConfig) -> Result<Self>;
}

// =============================================================================
// Writer
// =============================================================================

/// Append-only buffer for spill encodings.
#[derive(Debug, Default)]
pub struct SpillWriter {
    buf: BytesMut,
}

impl SpillWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Appends a type tag byte.
    pub fn append_tag(&mut self, tag: TypeTag) {
        self.buf.put_i8(tag.code());
    }

    /// Appends one raw byte.
    pub fn append_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Appends a little-endian `i32`.
    pub fn append_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    /// Appends a little-endian `i64`.
    pub fn append_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    /// Appends a little-endian `u64`.
    pub fn append_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    /// Appends a little-endian `f64`.
    pub fn append_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Appends bytes with no framing.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Appends an `i32` length or count.
    ///
    /// # Errors
    ///
    /// Fails if `len` does not fit in an `i32`.
    pub fn append_len(&mut self, len: usize) -> Result<()> {
        let prefix = i32::try_from(len).map_err(|_| {
            Error::new(ErrorKind::SpillBadLength {
                length: i64::try_from(len).unwrap_or(i64::MAX),
                limit: i32::MAX as usize,
            })
        })?;
        self.append_i32(prefix);
        Ok(())
    }

    /// Appends an `i32` length followed by the bytes.
    ///
    /// # Errors
    ///
    /// Fails if the payload is longer than `i32::MAX`.
    pub fn append_str_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.append_len(bytes.len())?;
        self.append_bytes(bytes);
        Ok(())
    }

    /// Appends the bytes followed by a NUL terminator.
    ///
    /// # Errors
    ///
    /// Fails if the bytes contain a NUL.
    pub fn append_cstr(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.contains(&0) {
            return Err(Error::new(ErrorKind::InteriorNul {
                what: "terminator-delimited spill run",
            }));
        }
        self.append_bytes(bytes);
        self.append_u8(0);
        Ok(())
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the encoded stream.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        trace!(bytes = self.buf.len(), "spill stream encoded");
        self.buf.freeze()
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Bounds-checked cursor over a spill stream.
#[derive(Debug, Clone)]
pub struct SpillReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SpillReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current byte offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if every byte has been read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Attaches the current offset to an error.
    fn reject(&self, err: Error) -> Error {
        debug!(offset = self.pos, error = %err.kind, "rejecting spill stream");
        err.with_context(ErrorContext::new().with_offset(self.pos))
    }

    /// Reads `len` raw bytes.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::SpillTruncated`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(self.reject(Error::spill_truncated(len, remaining)));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Skips `len` bytes.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Reads a type tag byte.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::SpillUnknownTag`] if the byte names no value kind.
    pub fn read_tag(&mut self) -> Result<TypeTag> {
        let code = i8::from_le_bytes(self.read_array()?);
        TypeTag::from_code(code).ok_or_else(|| {
            // Point at the tag byte itself.
            self.pos -= 1;
            let err = self.reject(Error::new(ErrorKind::SpillUnknownTag(code)));
            self.pos += 1;
            err
        })
    }

    /// Reads one raw byte.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    /// Reads a little-endian `i32`.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads a little-endian `i64`.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Reads a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Reads a little-endian `f64`.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_bytes`].
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Reads an `i32` length or count and checks it against `limit`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::SpillBadLength`] for negative values or values above
    /// `limit`.
    pub fn read_len(&mut self, limit: usize) -> Result<usize> {
        let raw = self.read_i32()?;
        match usize::try_from(raw) {
            Ok(len) if len <= limit => Ok(len),
            _ => Err(self.reject(Error::new(ErrorKind::SpillBadLength {
                length: i64::from(raw),
                limit,
            }))),
        }
    }

    /// Reads an `i32` length followed by that many bytes.
    ///
    /// # Errors
    ///
    /// See [`SpillReader::read_len`] and [`SpillReader::read_bytes`].
    pub fn read_str_bytes(&mut self, limit: usize) -> Result<&'a [u8]> {
        let len = self.read_len(limit)?;
        self.read_bytes(len)
    }

    /// Reads bytes up to a NUL terminator, consuming the terminator.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::SpillMissingTerminator`] if no NUL remains.
    pub fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(self.reject(Error::new(ErrorKind::SpillMissingTerminator)));
        };
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    fn utf8(&self, bytes: &'a [u8]) -> Result<&'a str> {
        std::str::from_utf8(bytes)
            .map_err(|_| self.reject(Error::new(ErrorKind::SpillInvalidUtf8)))
    }

    fn read_string(&mut self, limit: usize) -> Result<&'a str> {
        let bytes = self.read_str_bytes(limit)?;
        self.utf8(bytes)
    }

    fn read_cstring(&mut self) -> Result<&'a str> {
        let bytes = self.read_cstr()?;
        self.utf8(bytes)
    }
}

// =============================================================================
// Value Encoding
// =============================================================================

impl SorterSerializable for Value {
    fn serialize_for_sorter(&self, writer: &mut SpillWriter) -> Result<()> {
        writer.append_tag(self.type_tag());
        match self {
            Self::Missing | Self::MinKey | Self::MaxKey | Self::Null | Self::Undefined => {}
            Self::Int(n) => writer.append_i32(*n),
            Self::Long(n) => writer.append_i64(*n),
            Self::Double(n) => writer.append_f64(*n),
            Self::Decimal(d) => {
                writer.append_u64(d.low());
                writer.append_u64(d.high());
            }
            Self::Bool(b) => writer.append_u8(u8::from(*b)),
            Self::Date(date) => writer.append_i64(date.millis()),
            Self::Timestamp(ts) => writer.append_u64(ts.as_u64()),
            Self::ObjectId(oid) => writer.append_bytes(oid.bytes()),
            Self::String(s) | Self::Symbol(s) | Self::Code(s) => {
                writer.append_str_bytes(s.as_bytes())?;
            }
            Self::BinData(bin) => {
                writer.append_u8(bin.subtype());
                writer.append_str_bytes(bin.bytes())?;
            }
            Self::Regex(re) => {
                writer.append_cstr(re.pattern().as_bytes())?;
                writer.append_cstr(re.flags().as_bytes())?;
            }
            Self::Document(doc) => doc.serialize_for_sorter(writer)?,
            Self::DbRef(dbref) => {
                writer.append_bytes(dbref.oid().bytes());
                writer.append_cstr(dbref.ns().as_bytes())?;
            }
            Self::CodeWithScope(cws) => {
                writer.append_str_bytes(cws.code().as_bytes())?;
                cws.scope().serialize_for_sorter(writer)?;
            }
            Self::Array(array) => {
                writer.append_len(array.len())?;
                for value in array {
                    value.serialize_for_sorter(writer)?;
                }
            }
        }
        Ok(())
    }

    fn deserialize_for_sorter(reader: &mut SpillReader<'_>, config: &SpillConfig) -> Result<Self> {
        let mut decoder = Decoder::new(reader, config);
        match decoder.element()? {
            Element::Scalar(value) => Ok(value),
            Element::Open(root) => decoder.run(root)?.close(),
        }
    }
}

impl SorterSerializable for Document {
    fn serialize_for_sorter(&self, writer: &mut SpillWriter) -> Result<()> {
        writer.append_len(self.len())?;
        for (name, value) in self.iter() {
            writer.append_cstr(name.as_bytes())?;
            value.serialize_for_sorter(writer)?;
        }
        Ok(())
    }

    fn deserialize_for_sorter(reader: &mut SpillReader<'_>, config: &SpillConfig) -> Result<Self> {
        let mut decoder = Decoder::new(reader, config);
        let root = decoder.open(Kind::Document)?;
        decoder.run(root)?.into_document()
    }
}

/// Upper bound for a preallocation driven by an untrusted count: every
/// element takes at least one byte.
fn capacity_for(count: usize, reader: &SpillReader<'_>) -> usize {
    count.min(reader.remaining())
}

// =============================================================================
// Value Decoding
// =============================================================================

/// A container open in the spill stream, with its element count still
/// outstanding.
struct Open {
    partial: Partial,
    remaining: usize,
}

enum Element {
    Scalar(Value),
    Open(Open),
}

/// Spill decoder that keeps open containers on the heap.
struct Decoder<'r, 'a> {
    reader: &'r mut SpillReader<'a>,
    config: &'r SpillConfig,
    parents: Vec<Open>,
    depth: usize,
}

impl<'r, 'a> Decoder<'r, 'a> {
    fn new(reader: &'r mut SpillReader<'a>, config: &'r SpillConfig) -> Self {
        Self {
            reader,
            config,
            parents: Vec::new(),
            depth: 0,
        }
    }

    /// Rejects opening `levels` more containers.
    fn enter(&self, levels: usize) -> Result<()> {
        let limit = self.config.max_depth();
        if self.depth + levels > limit {
            return Err(Error::depth_exceeded(limit)
                .with_context(ErrorContext::new().with_offset(self.reader.offset())));
        }
        Ok(())
    }

    /// Opens a container whose element count comes next in the stream.
    fn open(&mut self, kind: Kind) -> Result<Open> {
        let levels = kind.levels();
        self.enter(levels)?;
        let count = self.reader.read_len(self.config.max_payload_len())?;
        self.depth += levels;
        Ok(Open {
            partial: Partial::new(kind, capacity_for(count, self.reader)),
            remaining: count,
        })
    }

    fn element(&mut self) -> Result<Element> {
        let limit = self.config.max_payload_len();
        let reader = &mut *self.reader;
        let value = match reader.read_tag()? {
            TypeTag::Missing => Value::Missing,
            TypeTag::MinKey => Value::MinKey,
            TypeTag::MaxKey => Value::MaxKey,
            TypeTag::Null => Value::Null,
            TypeTag::Undefined => Value::Undefined,
            TypeTag::Int => Value::Int(reader.read_i32()?),
            TypeTag::Long => Value::Long(reader.read_i64()?),
            TypeTag::Double => Value::Double(reader.read_f64()?),
            TypeTag::Decimal => {
                let low = reader.read_u64()?;
                let high = reader.read_u64()?;
                Value::from(Decimal128::from_bits(high, low))
            }
            TypeTag::Bool => Value::Bool(reader.read_u8()? != 0),
            TypeTag::Date => Value::Date(Date::from_millis(reader.read_i64()?)),
            TypeTag::Timestamp => Value::Timestamp(Timestamp::from_u64(reader.read_u64()?)),
            TypeTag::ObjectId => Value::ObjectId(ObjectId::from_bytes(reader.read_array()?)),
            TypeTag::String => Value::from(reader.read_string(limit)?),
            TypeTag::Symbol => Value::symbol(reader.read_string(limit)?),
            TypeTag::Code => Value::code(reader.read_string(limit)?),
            TypeTag::BinData => {
                let subtype = reader.read_u8()?;
                Value::binary(subtype, reader.read_str_bytes(limit)?)
            }
            TypeTag::Regex => {
                let pattern = reader.read_cstring()?;
                let flags = reader.read_cstring()?;
                Value::regex(pattern, flags)?
            }
            TypeTag::DbRef => {
                let oid = ObjectId::from_bytes(reader.read_array()?);
                let ns = reader.read_cstring()?;
                Value::db_ref(ns, oid)?
            }
            TypeTag::Array => return self.open(Kind::Array).map(Element::Open),
            TypeTag::Document => return self.open(Kind::Document).map(Element::Open),
            TypeTag::CodeWithScope => {
                self.enter(1)?;
                let code = self.reader.read_string(limit)?.to_owned();
                return self.open(Kind::CodeWithScope(code)).map(Element::Open);
            }
        };
        Ok(Element::Scalar(value))
    }

    /// Reads elements until `root` and everything opened inside it are
    /// complete.
    fn run(mut self, root: Open) -> Result<Partial> {
        let mut current = root;
        loop {
            if current.remaining == 0 {
                let Some(mut parent) = self.parents.pop() else {
                    return Ok(current.partial);
                };
                let mut done = current.partial;
                self.depth -= done.kind().levels();
                let name = done.name.take();
                parent.partial.push(name, done.close()?);
                current = parent;
                continue;
            }
            current.remaining -= 1;
            let name = if current.partial.keyed() {
                Some(self.reader.read_cstring()?.to_owned())
            } else {
                None
            };
            match self.element() {
                Ok(Element::Scalar(value)) => current.partial.push(name, value),
                Ok(Element::Open(mut child)) => {
                    child.partial.name = name;
                    self.parents.push(std::mem::replace(&mut current, child));
                }
                Err(err) => {
                    let chain: Vec<&Partial> = self
                        .parents
                        .iter()
                        .map(|open| &open.partial)
                        .chain([&current.partial])
                        .collect();
                    return Err(partial::locate(err, &chain, name.as_deref()));
                }
            }
        }
    }
}
