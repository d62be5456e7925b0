//! Shared composite payloads: documents, arrays, and the two legacy pairs.
//!
//! Every composite caches its nesting depth at construction so the bound can
//! be checked without walking children again.

use std::fmt;
use std::sync::Arc;

use crate::cell::StrCell;
use crate::error::{Error, ErrorKind, Result};
use crate::limits::MAX_DEPTH;
use crate::scalar::ObjectId;
use crate::value::Value;

fn check_depth(depth: usize) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(Error::depth_exceeded(MAX_DEPTH));
    }
    Ok(depth)
}

fn check_name(name: &str) -> Result<()> {
    if name.contains('\0') {
        return Err(Error::new(ErrorKind::InteriorNul { what: "field name" }));
    }
    Ok(())
}

struct DocumentCell {
    fields: Vec<(String, Value)>,
    depth: usize,
}

/// Ordered mapping from field name to value.
///
/// Field order is preserved and names need not be unique. Missing values
/// are dropped at construction, so a document never holds a missing field.
#[derive(Clone)]
pub struct Document(Arc<DocumentCell>);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(DocumentCell {
            fields: Vec::new(),
            depth: 1,
        }))
    }

    /// Builds a document from `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DepthExceeded`] when the result would nest deeper
    /// than [`MAX_DEPTH`], or [`ErrorKind::InteriorNul`] for a field name
    /// containing NUL.
    pub fn from_fields<I, K>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut kept = Vec::new();
        let mut child_depth = 0;
        for (name, value) in fields {
            if value.missing() {
                continue;
            }
            let name = name.into();
            check_name(&name)?;
            child_depth = child_depth.max(value.depth());
            kept.push((name, value));
        }
        let depth = check_depth(child_depth + 1)?;
        Ok(Self(Arc::new(DocumentCell {
            fields: kept,
            depth,
        })))
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.0.fields
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the first value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.fields.len()
    }

    /// Returns true if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.fields.is_empty()
    }

    /// Nesting depth; an empty document is one level deep.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Returns true if both handles share one payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Approximate heap footprint of the fields, for memory accounting.
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        std::mem::size_of::<DocumentCell>()
            + self
                .0
                .fields
                .iter()
                .map(|(name, value)| {
                    name.capacity() + std::mem::size_of::<(String, Value)>() + value.heap_size()
                })
                .sum::<usize>()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value:?}")?;
        }
        f.write_str("}")
    }
}

struct ArrayCell {
    values: Vec<Value>,
    depth: usize,
}

/// Ordered sequence of values with dense indices.
#[derive(Clone)]
pub struct Array(Arc<ArrayCell>);

impl Array {
    /// Builds an array, dropping missing values so indices stay dense.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DepthExceeded`] when the result would nest deeper
    /// than [`MAX_DEPTH`].
    pub fn new(values: Vec<Value>) -> Result<Self> {
        let mut values = values;
        values.retain(|value| !value.missing());
        let child_depth = values.iter().map(Value::depth).max().unwrap_or(0);
        let depth = check_depth(child_depth + 1)?;
        Ok(Self(Arc::new(ArrayCell { values, depth })))
    }

    /// Creates an empty array.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::new(ArrayCell {
            values: Vec::new(),
            depth: 1,
        }))
    }

    /// Returns the elements.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0.values
    }

    /// Iterates over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.values.iter()
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.values.get(index)
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values.len()
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values.is_empty()
    }

    /// Nesting depth; an empty array is one level deep.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Returns true if both handles share one payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Approximate heap footprint of the elements, for memory accounting.
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        std::mem::size_of::<ArrayCell>()
            + self.0.values.capacity() * std::mem::size_of::<Value>()
            + self.0.values.iter().map(Value::heap_size).sum::<usize>()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value:?}")?;
        }
        f.write_str("]")
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Legacy JavaScript code paired with a scope document.
#[derive(Clone)]
pub struct CodeWithScope {
    code: StrCell,
    scope: Document,
}

impl CodeWithScope {
    /// Pairs code with its scope.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DepthExceeded`] if the scope is already at the
    /// depth limit, since the pair adds one level.
    pub fn new(code: &str, scope: Document) -> Result<Self> {
        check_depth(scope.depth() + 1)?;
        Ok(Self {
            code: StrCell::new(code),
            scope,
        })
    }

    /// Returns the code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the scope document.
    #[must_use]
    pub const fn scope(&self) -> &Document {
        &self.scope
    }

    /// Nesting depth: the scope plus one.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scope.depth() + 1
    }

    /// Approximate heap footprint, for memory accounting.
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.code.cell().heap_size() + self.scope.approximate_size()
    }
}

impl fmt::Debug for CodeWithScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeWScope(\"{}\", {:?})", self.code(), self.scope)
    }
}

/// Legacy database pointer: a namespace and an object id.
#[derive(Clone, PartialEq, Eq)]
pub struct DbRef {
    ns: String,
    oid: ObjectId,
}

impl DbRef {
    /// Creates a database pointer.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InteriorNul`] if the namespace contains NUL.
    pub fn new(ns: &str, oid: ObjectId) -> Result<Self> {
        if ns.contains('\0') {
            return Err(Error::new(ErrorKind::InteriorNul { what: "namespace" }));
        }
        Ok(Self {
            ns: ns.to_string(),
            oid,
        })
    }

    /// Returns the namespace.
    #[must_use]
    pub fn ns(&self) -> &str {
        &self.ns
    }

    /// Returns the object id.
    #[must_use]
    pub const fn oid(&self) -> ObjectId {
        self.oid
    }

    /// Approximate heap footprint, for memory accounting.
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.ns.capacity()
    }
}

impl fmt::Debug for DbRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DBRef(\"{}\", {})", self.ns, self.oid)
    }
}
