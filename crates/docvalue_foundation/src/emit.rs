//! Canonical emission of values into a document-model builder.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::limits::MAX_DEPTH;
use crate::value::Value;

/// Builder callbacks receiving a value tree in document order.
///
/// `field` is the element name inside a document and `None` inside an
/// array, where the builder numbers elements itself. Every `begin_*` call is
/// matched by one `end`.
pub trait ElementBuilder {
    /// Appends a non-container value.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn append_scalar(&mut self, field: Option<&str>, value: &Value) -> Result<()>;

    /// Opens a nested document.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn begin_document(&mut self, field: Option<&str>) -> Result<()>;

    /// Opens a nested array.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn begin_array(&mut self, field: Option<&str>) -> Result<()>;

    /// Closes the innermost open container.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn end(&mut self) -> Result<()>;
}

impl Value {
    /// Emits this value at nesting level `depth` (top-level document fields
    /// are level 1). Missing values emit nothing, so arrays stay dense and
    /// documents omit the field.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::DepthExceeded`](crate::ErrorKind::DepthExceeded) when any
    /// value lands deeper than [`MAX_DEPTH`], plus whatever the builder reports.
    pub fn write_to(
        &self,
        builder: &mut dyn ElementBuilder,
        field: Option<&str>,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::depth_exceeded(MAX_DEPTH));
        }
        match self {
            Self::Missing => Ok(()),
            Self::Document(doc) => {
                builder.begin_document(field)?;
                doc.write_fields(builder, depth + 1)?;
                builder.end()
            }
            Self::Array(array) => {
                builder.begin_array(field)?;
                for value in array {
                    value.write_to(builder, None, depth + 1)?;
                }
                builder.end()
            }
            _ => builder.append_scalar(field, self),
        }
    }
}

impl Document {
    /// Emits every field at nesting level `depth`.
    ///
    /// # Errors
    ///
    /// See [`Value::write_to`].
    pub fn write_fields(&self, builder: &mut dyn ElementBuilder, depth: usize) -> Result<()> {
        for (name, value) in self.iter() {
            value.write_to(builder, Some(name), depth)?;
        }
        Ok(())
    }
}
