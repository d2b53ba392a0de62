//! Permanent per-type field layouts.
//!
//! The first encode or decode of a record type computes its layout: the
//! ordered field descriptors with prewritten `"name":` bytes plus a
//! by-name lookup table. Layouts are stored forever in a process-wide
//! concurrent map keyed by type identity; concurrent first lookups may
//! race the computation, but exactly one result is stored.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::encode::{needs_escape, write_escaped};
use crate::record::{FieldIndex, FieldSpec, Record};

/// One field of a cached layout. Immutable once computed.
#[derive(Debug)]
pub(crate) struct FieldLayout {
    pub(crate) name: Box<str>,
    /// Prewritten `"name":` bytes, escaped as needed.
    pub(crate) quoted_key: Box<[u8]>,
    pub(crate) index: FieldIndex,
    pub(crate) omit_empty: bool,
    pub(crate) as_string: bool,
}

/// Ordered, filtered field layout of one record type.
#[derive(Debug)]
pub(crate) struct StructLayout {
    fields: Box<[FieldLayout]>,
    by_name: HashMap<Box<str>, usize>,
}

impl StructLayout {
    pub(crate) fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub(crate) fn field_by_name(&self, name: &str) -> Option<&FieldLayout> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }
}

static LAYOUTS: Lazy<DashMap<TypeId, Arc<StructLayout>>> = Lazy::new(DashMap::new);

/// Looks up the layout for `T`, computing and caching it on first use.
pub(crate) fn of<T: Record>() -> Arc<StructLayout> {
    let key = TypeId::of::<T>();
    if let Some(hit) = LAYOUTS.get(&key) {
        return Arc::clone(hit.value());
    }
    let layout = Arc::new(compute(T::fields()));
    trace!(
        ty = std::any::type_name::<T>(),
        fields = layout.fields.len(),
        "computed record layout"
    );
    Arc::clone(LAYOUTS.entry(key).or_insert(layout).value())
}

fn quoted_key_bytes(name: &str) -> Box<[u8]> {
    let mut buf = ByteBuffer::with_capacity(name.len() + 3);
    buf.push_byte(b'"');
    if needs_escape(name.as_bytes()) {
        write_escaped(&mut buf, name);
    } else {
        buf.extend_from_slice(name.as_bytes());
    }
    buf.extend_from_slice(b"\":");
    buf.as_slice().to_vec().into_boxed_slice()
}

fn compute(specs: Vec<FieldSpec>) -> StructLayout {
    let mut fields = Vec::with_capacity(specs.len());
    let mut by_name = HashMap::with_capacity(specs.len());
    for spec in specs {
        if spec.name == "-" {
            continue;
        }
        by_name.insert(spec.name.into(), fields.len());
        fields.push(FieldLayout {
            name: spec.name.into(),
            quoted_key: quoted_key_bytes(spec.name),
            index: spec.index,
            omit_empty: spec.omit_empty,
            as_string: spec.as_string,
        });
    }
    StructLayout {
        fields: fields.into_boxed_slice(),
        by_name,
    }
}
