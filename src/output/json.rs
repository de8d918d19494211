/// JSON output, with optional per-type converters for values that don't implement `Serialize`.
///
/// Values of foreign types are wrapped in [`Opaque`] inside an otherwise
/// serializable structure; while [`write_json_with`] runs, each `Opaque<T>` is
/// converted through the converter registered for `T` in a [`TypeHandlers`].
use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::rc::Rc;

use serde::{Serialize, Serializer, ser};
use serde_json::Value;

use super::errors::{OutputError, report};

type Converter = Rc<dyn Fn(&dyn Any) -> Option<Value>>;

thread_local! {
    static ACTIVE: RefCell<Vec<TypeHandlers>> = const { RefCell::new(Vec::new()) };
}

/// A mapping from concrete types to JSON converters.
#[derive(Clone, Default)]
pub struct TypeHandlers {
    converters: HashMap<TypeId, Converter>,
}

impl TypeHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the converter used for `Opaque<T>` values.
    #[must_use]
    pub fn with<T: Any>(mut self, convert: impl Fn(&T) -> Value + 'static) -> Self {
        let converter: Converter =
            Rc::new(move |any: &dyn Any| any.downcast_ref::<T>().map(&convert));
        self.converters.insert(TypeId::of::<T>(), converter);
        self
    }

    fn get(&self, id: TypeId) -> Option<Converter> {
        self.converters.get(&id).cloned()
    }
}

impl fmt::Debug for TypeHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandlers")
            .field("types", &self.converters.len())
            .finish()
    }
}

/// Keeps a `TypeHandlers` active for the current thread until dropped.
struct ActiveHandlers;

impl ActiveHandlers {
    fn push(handlers: &TypeHandlers) -> Self {
        ACTIVE.with(|stack| stack.borrow_mut().push(handlers.clone()));
        Self
    }
}

impl Drop for ActiveHandlers {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// A value serialized through the active [`TypeHandlers`] rather than `Serialize`.
///
/// Serializing an `Opaque<T>` with no converter registered for `T` is an error.
#[derive(Debug, Clone)]
pub struct Opaque<T>(pub T);

impl<T: Any> Serialize for Opaque<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let converter = ACTIVE.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|handlers| handlers.get(TypeId::of::<T>()))
        });
        match converter.and_then(|convert| convert(&self.0)) {
            Some(value) => value.serialize(serializer),
            None => Err(ser::Error::custom(format!(
                "no JSON handler registered for `{}`",
                type_name::<T>()
            ))),
        }
    }
}

/// `serialize_with` helper that writes any `Display` value as a JSON string.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize_display<T: Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Write `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns `OutputError::Json` if serialization fails, `OutputError::Io` on write failure.
pub fn write_json<T: Serialize + ?Sized>(
    out: &mut impl Write,
    value: &T,
) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write `value` as pretty JSON, converting `Opaque` values through `handlers`.
///
/// # Errors
///
/// Returns `OutputError::Json` if serialization fails (including an `Opaque<T>`
/// with no converter for `T`), `OutputError::Io` on write failure.
pub fn write_json_with<T: Serialize + ?Sized>(
    out: &mut impl Write,
    value: &T,
    handlers: &TypeHandlers,
) -> Result<(), OutputError> {
    let _active = ActiveHandlers::push(handlers);
    // Serialize fully before writing so a failed conversion leaves no partial output.
    let text = serde_json::to_string_pretty(value)?;
    writeln!(out, "{text}")?;
    Ok(())
}

/// Print `value` as pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    report(write_json(&mut io::stdout().lock(), value));
}

/// Print `value` as pretty JSON to stdout, converting `Opaque` values through `handlers`.
pub fn print_json_with<T: Serialize + ?Sized>(value: &T, handlers: &TypeHandlers) {
    report(write_json_with(&mut io::stdout().lock(), value, handlers));
}

/// Write `value` as compact single-line JSON followed by a newline.
///
/// # Errors
///
/// Returns `OutputError::Json` if serialization fails, `OutputError::Io` on write failure.
pub fn write_json_compact<T: Serialize + ?Sized>(
    out: &mut impl Write,
    value: &T,
) -> Result<(), OutputError> {
    let text = serde_json::to_string(value)?;
    writeln!(out, "{text}")?;
    Ok(())
}

/// Print `value` as compact single-line JSON to stdout.
pub fn print_json_compact<T: Serialize + ?Sized>(value: &T) {
    report(write_json_compact(&mut io::stdout().lock(), value));
}
