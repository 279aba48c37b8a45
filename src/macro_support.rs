//! Items the code generated by `mwproc` refers to.

pub use crate::url::{write_value, NamedEnum, ParamWriter, Prefixed, WriteParams, WriteValue};
