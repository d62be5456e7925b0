//! Conversion between values and `bson` documents.
//!
//! Emission runs through [`BsonBuilder`], an [`ElementBuilder`] that
//! assembles a [`bson::Document`]; the depth bound is enforced by
//! [`Value::write_to`]. Construction walks the `bson` tree and copies every
//! payload, so the resulting values never alias the source document.
//!
//! `bson::Document` keys are unique, so a value document that repeats a
//! field name keeps only the last value for that name when emitted.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, JavaScriptCodeWithScope, Regex};
use docvalue_foundation::{
    Date, Decimal128, Document, ElementBuilder, Error, ErrorKind, MAX_DEPTH, ObjectId, Result,
    Timestamp, Value,
};

use crate::partial::{self, Kind, Partial};

/// BSON element type byte of the legacy DBPointer.
const DB_POINTER_TYPE: u8 = 0x0c;

fn document_error(message: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Document(message.to_string()))
}

enum Frame {
    Document(bson::Document),
    Array(Vec<Bson>),
}

struct OpenFrame {
    field: Option<String>,
    frame: Frame,
}

/// Builds a [`bson::Document`] from builder callbacks.
pub struct BsonBuilder {
    stack: Vec<OpenFrame>,
}

impl BsonBuilder {
    /// Creates a builder for one top-level document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: vec![OpenFrame {
                field: None,
                frame: Frame::Document(bson::Document::new()),
            }],
        }
    }

    /// Returns the finished document.
    ///
    /// # Errors
    ///
    /// Fails if a nested container is still open.
    pub fn finish(mut self) -> Result<bson::Document> {
        match self.stack.pop() {
            Some(OpenFrame {
                frame: Frame::Document(doc),
                ..
            }) if self.stack.is_empty() => Ok(doc),
            _ => Err(document_error("builder finished with containers still open")),
        }
    }

    fn push(&mut self, field: Option<&str>, element: Bson) -> Result<()> {
        let Some(top) = self.stack.last_mut() else {
            unreachable!("the root frame is only removed by finish");
        };
        match (&mut top.frame, field) {
            (Frame::Document(doc), Some(name)) => {
                doc.insert(name, element);
                Ok(())
            }
            (Frame::Document(_), None) => {
                Err(document_error("document element appended without a field name"))
            }
            (Frame::Array(items), _) => {
                items.push(element);
                Ok(())
            }
        }
    }

    fn open(&mut self, field: Option<&str>, frame: Frame) {
        self.stack.push(OpenFrame {
            field: field.map(str::to_string),
            frame,
        });
    }
}

impl Default for BsonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementBuilder for BsonBuilder {
    fn append_scalar(&mut self, field: Option<&str>, value: &Value) -> Result<()> {
        if value.missing() {
            return Ok(());
        }
        let element = scalar_to_bson(value)?;
        self.push(field, element)
    }

    fn begin_document(&mut self, field: Option<&str>) -> Result<()> {
        self.open(field, Frame::Document(bson::Document::new()));
        Ok(())
    }

    fn begin_array(&mut self, field: Option<&str>) -> Result<()> {
        self.open(field, Frame::Array(Vec::new()));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(document_error("end called without an open container"));
        }
        let Some(OpenFrame { field, frame }) = self.stack.pop() else {
            unreachable!("stack holds at least two frames");
        };
        let element = match frame {
            Frame::Document(doc) => Bson::Document(doc),
            Frame::Array(items) => Bson::Array(items),
        };
        self.push(field.as_deref(), element)
    }
}

fn scalar_to_bson(value: &Value) -> Result<Bson> {
    let element = match value {
        Value::MinKey => Bson::MinKey,
        Value::MaxKey => Bson::MaxKey,
        Value::Null => Bson::Null,
        Value::Undefined => Bson::Undefined,
        Value::Int(n) => Bson::Int32(*n),
        Value::Long(n) => Bson::Int64(*n),
        Value::Double(n) => Bson::Double(*n),
        Value::Decimal(d) => Bson::Decimal128(bson::Decimal128::from_bytes(d.to_le_bytes())),
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Date(date) => Bson::DateTime(bson::DateTime::from_millis(date.millis())),
        Value::ObjectId(oid) => Bson::ObjectId(bson::oid::ObjectId::from_bytes(*oid.bytes())),
        Value::Timestamp(ts) => Bson::Timestamp(bson::Timestamp {
            time: ts.secs(),
            increment: ts.increment(),
        }),
        Value::String(s) => Bson::String(s.as_str().to_string()),
        Value::Symbol(s) => Bson::Symbol(s.as_str().to_string()),
        Value::Code(s) => Bson::JavaScriptCode(s.as_str().to_string()),
        Value::BinData(bin) => Bson::Binary(Binary {
            subtype: BinarySubtype::from(bin.subtype()),
            bytes: bin.bytes().to_vec(),
        }),
        Value::Regex(re) => Bson::RegularExpression(Regex {
            pattern: re.pattern().to_string(),
            options: re.flags().to_string(),
        }),
        Value::CodeWithScope(cws) => Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code: cws.code().to_string(),
            scope: document_to_bson(cws.scope())?,
        }),
        Value::DbRef(dbref) => db_pointer(dbref.ns(), dbref.oid())?,
        Value::Missing | Value::Document(_) | Value::Array(_) => {
            return Err(document_error(format!(
                "{} values are not scalars",
                value.type_tag()
            )));
        }
    };
    Ok(element)
}

/// Builds a DBPointer element by decoding its wire form, since the `bson`
/// crate does not expose a constructor.
fn db_pointer(ns: &str, oid: ObjectId) -> Result<Bson> {
    let ns_len = i32::try_from(ns.len() + 1).map_err(|_| document_error("namespace too long"))?;

    let mut element = Vec::with_capacity(ns.len() + 20);
    element.push(DB_POINTER_TYPE);
    element.extend_from_slice(b"p\0");
    element.extend_from_slice(&ns_len.to_le_bytes());
    element.extend_from_slice(ns.as_bytes());
    element.push(0);
    element.extend_from_slice(oid.bytes());

    let total = i32::try_from(element.len() + 5).map_err(|_| document_error("namespace too long"))?;
    let mut raw = Vec::with_capacity(element.len() + 5);
    raw.extend_from_slice(&total.to_le_bytes());
    raw.extend_from_slice(&element);
    raw.push(0);

    let mut doc = bson::Document::from_reader(&mut raw.as_slice()).map_err(document_error)?;
    doc.remove("p")
        .ok_or_else(|| document_error("DBPointer element lost while decoding"))
}

/// Recovers namespace and id from a DBPointer through its wire form.
fn read_db_pointer(pointer: &bson::DbPointer) -> Result<(String, ObjectId)> {
    let mut doc = bson::Document::new();
    doc.insert("p", Bson::DbPointer(pointer.clone()));
    let mut raw = Vec::new();
    doc.to_writer(&mut raw).map_err(document_error)?;

    // [i32 size] [0x0c] "p\0" [i32 ns len] ns "\0" [12 id bytes] "\0"
    let malformed = || document_error("malformed DBPointer encoding");
    let header = raw.get(4..11).ok_or_else(malformed)?;
    if header[0] != DB_POINTER_TYPE || &header[1..3] != b"p\0" {
        return Err(malformed());
    }
    let ns_len = i32::from_le_bytes([header[3], header[4], header[5], header[6]]);
    let ns_len = usize::try_from(ns_len).map_err(|_| malformed())?;
    let ns_end = 11 + ns_len.checked_sub(1).ok_or_else(malformed)?;
    let ns = raw.get(11..ns_end).ok_or_else(malformed)?;
    let oid: [u8; ObjectId::LEN] = raw
        .get(ns_end + 1..ns_end + 1 + ObjectId::LEN)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(malformed)?;
    let ns = String::from_utf8(ns.to_vec()).map_err(|_| malformed())?;
    Ok((ns, ObjectId::from_bytes(oid)))
}

/// Emits a document.
///
/// # Errors
///
/// Fails if the document nests deeper than [`MAX_DEPTH`].
pub fn document_to_bson(doc: &Document) -> Result<bson::Document> {
    let mut builder = BsonBuilder::new();
    doc.write_fields(&mut builder, 1)?;
    builder.finish()
}

/// Emits a value as the single field `name` of a new document. A missing
/// value yields an empty document.
///
/// # Errors
///
/// Fails if the value nests deeper than [`MAX_DEPTH`].
pub fn wrap(value: &Value, name: &str) -> Result<bson::Document> {
    let mut builder = BsonBuilder::new();
    value.write_to(&mut builder, Some(name), 1)?;
    builder.finish()
}

/// Emits a value as a standalone element; `None` for missing.
///
/// # Errors
///
/// Fails if the value nests deeper than [`MAX_DEPTH`].
pub fn value_to_bson(value: &Value) -> Result<Option<Bson>> {
    let mut doc = wrap(value, "")?;
    Ok(doc.remove(""))
}

/// Builds a value from an element.
///
/// # Errors
///
/// Fails if the element nests deeper than [`MAX_DEPTH`] or carries a name,
/// pattern, or namespace with an interior NUL.
pub fn value_from_bson(element: &Bson) -> Result<Value> {
    let mut converter = Converter::default();
    match converter.element(element)? {
        Converted::Scalar(value) => Ok(value),
        Converted::Open(root) => converter.run(root)?.close(),
    }
}

/// Builds a document from a `bson` document.
///
/// # Errors
///
/// See [`value_from_bson`].
pub fn document_from_bson(doc: &bson::Document) -> Result<Document> {
    let mut converter = Converter::default();
    let root = converter.open(Kind::Document, Source::Document(doc.iter()), doc.len())?;
    converter.run(root)?.into_document()
}

enum Source<'b> {
    Array(std::slice::Iter<'b, Bson>),
    Document(bson::document::Iter<'b>),
}

/// A `bson` container being converted, with its unread elements.
struct Pending<'b> {
    partial: Partial,
    source: Source<'b>,
}

impl<'b> Pending<'b> {
    fn next(&mut self) -> Option<(Option<String>, &'b Bson)> {
        match &mut self.source {
            Source::Array(items) => items.next().map(|item| (None, item)),
            Source::Document(fields) => fields
                .next()
                .map(|(name, item)| (Some(name.clone()), item)),
        }
    }
}

enum Converted<'b> {
    Scalar(Value),
    Open(Pending<'b>),
}

/// Walks a `bson` tree with open containers kept on the heap.
#[derive(Default)]
struct Converter<'b> {
    parents: Vec<Pending<'b>>,
    depth: usize,
}

impl<'b> Converter<'b> {
    fn open(&mut self, kind: Kind, source: Source<'b>, len: usize) -> Result<Pending<'b>> {
        let levels = kind.levels();
        if self.depth + levels > MAX_DEPTH {
            return Err(Error::depth_exceeded(MAX_DEPTH));
        }
        self.depth += levels;
        Ok(Pending {
            partial: Partial::new(kind, len),
            source,
        })
    }

    fn element(&mut self, element: &'b Bson) -> Result<Converted<'b>> {
        let value = match element {
            Bson::Double(n) => Value::Double(*n),
            Bson::String(s) => Value::from(s.as_str()),
            Bson::Array(items) => {
                let source = Source::Array(items.iter());
                return self.open(Kind::Array, source, items.len()).map(Converted::Open);
            }
            Bson::Document(doc) => {
                let source = Source::Document(doc.iter());
                return self.open(Kind::Document, source, doc.len()).map(Converted::Open);
            }
            Bson::Boolean(b) => Value::Bool(*b),
            Bson::Null => Value::Null,
            Bson::RegularExpression(re) => Value::regex(&re.pattern, &re.options)?,
            Bson::JavaScriptCode(code) => Value::code(code),
            Bson::JavaScriptCodeWithScope(cws) => {
                let kind = Kind::CodeWithScope(cws.code.clone());
                let source = Source::Document(cws.scope.iter());
                return self.open(kind, source, cws.scope.len()).map(Converted::Open);
            }
            Bson::Int32(n) => Value::Int(*n),
            Bson::Int64(n) => Value::Long(*n),
            Bson::Timestamp(ts) => Value::Timestamp(Timestamp::new(ts.time, ts.increment)),
            Bson::Binary(bin) => Value::binary(u8::from(bin.subtype), &bin.bytes),
            Bson::ObjectId(oid) => Value::ObjectId(ObjectId::from_bytes(oid.bytes())),
            Bson::DateTime(dt) => Value::Date(Date::from_millis(dt.timestamp_millis())),
            Bson::Symbol(s) => Value::symbol(s),
            Bson::Decimal128(d) => Value::from(Decimal128::from_le_bytes(d.bytes())),
            Bson::Undefined => Value::Undefined,
            Bson::MaxKey => Value::MaxKey,
            Bson::MinKey => Value::MinKey,
            Bson::DbPointer(pointer) => {
                let (ns, oid) = read_db_pointer(pointer)?;
                Value::db_ref(&ns, oid)?
            }
            #[allow(unreachable_patterns)]
            other => {
                return Err(document_error(format!(
                    "unsupported element type {:?}",
                    other.element_type()
                )));
            }
        };
        Ok(Converted::Scalar(value))
    }

    /// Converts elements until `root` and everything opened inside it are
    /// complete.
    fn run(mut self, root: Pending<'b>) -> Result<Partial> {
        let mut current = root;
        loop {
            let Some((name, element)) = current.next() else {
                let Some(mut parent) = self.parents.pop() else {
                    return Ok(current.partial);
                };
                let mut done = current.partial;
                self.depth -= done.kind().levels();
                let name = done.name.take();
                parent.partial.push(name, done.close()?);
                current = parent;
                continue;
            };
            match self.element(element) {
                Ok(Converted::Scalar(value)) => current.partial.push(name, value),
                Ok(Converted::Open(mut child)) => {
                    child.partial.name = name;
                    self.parents.push(std::mem::replace(&mut current, child));
                }
                Err(err) => {
                    let chain: Vec<&Partial> = self
                        .parents
                        .iter()
                        .map(|pending| &pending.partial)
                        .chain([&current.partial])
                        .collect();
                    return Err(partial::locate(err, &chain, name.as_deref()));
                }
            }
        }
    }
}
