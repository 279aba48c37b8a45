//! Conversion of typed parameter structs into API parameters.
//!
//! `#[derive(Params)]` generates implementations of these traits, see
//! [`crate::req`] for the structs that use it.

use std::borrow::Cow;
use std::num::{NonZeroU16, NonZeroU32};

/// Receives parameters in the order they are written.
pub trait ParamWriter {
    fn add(&mut self, name: &str, values: Vec<String>);
}

/// A set of named parameters.
pub trait WriteParams {
    fn write_params<W: ParamWriter + ?Sized>(&self, w: &mut W);
}

/// The value of one parameter.
pub trait WriteValue {
    /// `None` means the parameter is left out.
    fn values(&self) -> Option<Vec<String>>;
    /// only write the extra parameters a value brings along, excluding its own.
    fn write_extra<W: ParamWriter + ?Sized>(&self, _w: &mut W) {}
}

pub trait NamedEnum {
    fn variant_name(&self) -> &'static str;
}

pub fn write_value<W, V>(w: &mut W, name: &str, v: &V)
where
    W: ParamWriter + ?Sized,
    V: WriteValue + ?Sized,
{
    if let Some(values) = v.values() {
        w.add(name, values);
        v.write_extra(w);
    }
}

/// Prepends a module prefix such as `gcm` to every name.
pub struct Prefixed<'a, W: ?Sized> {
    inner: &'a mut W,
    prefix: &'a str,
}

impl<'a, W: ?Sized> Prefixed<'a, W> {
    pub fn new(inner: &'a mut W, prefix: &'a str) -> Self {
        Prefixed { inner, prefix }
    }
}

impl<W: ParamWriter + ?Sized> ParamWriter for Prefixed<'_, W> {
    fn add(&mut self, name: &str, values: Vec<String>) {
        let p = self.prefix;
        self.inner.add(&format!("{p}{name}"), values)
    }
}

/// Collects parameters into a list of pairs.
#[derive(Default, Debug)]
pub struct Collect(pub Vec<(String, Vec<String>)>);

impl ParamWriter for Collect {
    fn add(&mut self, name: &str, values: Vec<String>) {
        self.0.push((name.to_owned(), values));
    }
}

/// Joins the values of a multi-value parameter.
///
/// Values are separated by `|`, unless one of them contains a `|` itself,
/// in which case the whole value starts with `U+001F` and uses that as
/// separator. A single value is sent as it is, continuation values such
/// as `page|BAZ|3` rely on that.
#[must_use]
pub fn encode_multivalue<S: AsRef<str>>(values: &[S]) -> String {
    let sep = if values.len() > 1 && values.iter().any(|v| v.as_ref().contains('|')) {
        '\u{1F}'
    } else {
        '|'
    };
    let mut s = String::new();
    if sep != '|' {
        s.push(sep);
    }
    for (i, v) in values.iter().enumerate() {
        if i != 0 {
            s.push(sep);
        }
        s.push_str(v.as_ref());
    }
    s
}

impl WriteValue for str {
    fn values(&self) -> Option<Vec<String>> {
        Some(vec![self.to_owned()])
    }
}

impl WriteValue for String {
    fn values(&self) -> Option<Vec<String>> {
        self.as_str().values()
    }
}

impl WriteValue for Cow<'static, str> {
    fn values(&self) -> Option<Vec<String>> {
        Some(vec![self.to_string()])
    }
}

impl<T: WriteValue + ?Sized> WriteValue for &T {
    fn values(&self) -> Option<Vec<String>> {
        (**self).values()
    }
    fn write_extra<W: ParamWriter + ?Sized>(&self, w: &mut W) {
        (**self).write_extra(w)
    }
}

impl WriteValue for bool {
    fn values(&self) -> Option<Vec<String>> {
        self.then(|| vec![String::new()])
    }
}

impl<T: WriteValue> WriteValue for Option<T> {
    fn values(&self) -> Option<Vec<String>> {
        self.as_ref().and_then(T::values)
    }
    fn write_extra<W: ParamWriter + ?Sized>(&self, w: &mut W) {
        if let Some(this) = self {
            this.write_extra(w);
        }
    }
}

impl<T: WriteValue> WriteValue for Vec<T> {
    fn values(&self) -> Option<Vec<String>> {
        let values: Vec<_> = self.iter().filter_map(T::values).flatten().collect();
        (!values.is_empty()).then(|| values)
    }
    fn write_extra<W: ParamWriter + ?Sized>(&self, w: &mut W) {
        for v in self {
            v.write_extra(w);
        }
    }
}

impl<T: WriteParams> WriteParams for Option<T> {
    fn write_params<W: ParamWriter + ?Sized>(&self, w: &mut W) {
        if let Some(this) = self {
            this.write_params(w);
        }
    }
}

macro_rules! display_impls {
    ($($ty:ty),*$(,)?) => {$(
        impl WriteValue for $ty {
            fn values(&self) -> Option<Vec<String>> {
                Some(vec![self.to_string()])
            }
        }
    )*};
}

display_impls!(u16, u32, u64, usize, i32, i64, NonZeroU16, NonZeroU32);
