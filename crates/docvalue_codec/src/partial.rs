//! Containers under construction while a decoder walks its input.
//!
//! Both decoders keep open containers on the heap instead of recursing, so a
//! value nested to the depth limit never grows the call stack.

use docvalue_foundation::{Document, Error, ErrorKind, Result, Value};

/// Container kinds with elements of their own.
pub(crate) enum Kind {
    Array,
    Document,
    CodeWithScope(String),
}

impl Kind {
    /// Nesting levels the container occupies. A scope document sits one
    /// level inside its code-with-scope.
    pub(crate) fn levels(&self) -> usize {
        match self {
            Self::Array | Self::Document => 1,
            Self::CodeWithScope(_) => 2,
        }
    }
}

/// A container whose elements are still being collected.
pub(crate) struct Partial {
    /// Field name in the enclosing container, if that container is keyed.
    pub(crate) name: Option<String>,
    kind: Kind,
    entries: Vec<(Option<String>, Value)>,
}

impl Partial {
    pub(crate) fn new(kind: Kind, capacity: usize) -> Self {
        Self {
            name: None,
            kind,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns true if elements are read with a field name.
    pub(crate) fn keyed(&self) -> bool {
        !matches!(self.kind, Kind::Array)
    }

    pub(crate) fn push(&mut self, name: Option<String>, value: Value) {
        self.entries.push((name, value));
    }

    /// Builds the collected fields into a document, whatever the kind.
    pub(crate) fn into_document(self) -> Result<Document> {
        fields_to_document(self.entries)
    }

    /// Builds the finished container.
    pub(crate) fn close(self) -> Result<Value> {
        let Self { kind, entries, .. } = self;
        match kind {
            Kind::Array => Value::array(entries.into_iter().map(|(_, value)| value).collect()),
            Kind::Document => fields_to_document(entries).map(Value::Document),
            Kind::CodeWithScope(code) => {
                Value::code_with_scope(&code, fields_to_document(entries)?)
            }
        }
    }
}

fn fields_to_document(entries: Vec<(Option<String>, Value)>) -> Result<Document> {
    Document::from_fields(
        entries
            .into_iter()
            .map(|(name, value)| (name.unwrap_or_default(), value)),
    )
}

/// Attaches the dotted path of the element being read to a depth error.
///
/// `chain` runs from the outermost open container to the innermost, and
/// `name` is the field name of the element that failed, if any. Array
/// elements are named by their index. Other errors pass through unchanged.
pub(crate) fn locate(mut err: Error, chain: &[&Partial], name: Option<&str>) -> Error {
    if !matches!(err.kind, ErrorKind::DepthExceeded { .. }) {
        return err;
    }
    let path = chain
        .iter()
        .enumerate()
        .map(|(i, open)| {
            let key = match chain.get(i + 1) {
                Some(child) => child.name.as_deref(),
                None => name,
            };
            key.map_or_else(|| open.entries.len().to_string(), str::to_owned)
        })
        .collect::<Vec<_>>()
        .join(".");
    let context = err.context.take().unwrap_or_default().with_path(path);
    err.with_context(context)
}
