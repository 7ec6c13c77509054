//! Message values posted to Dart ports and their C representation.
//!
//! `Dart_CObject` mirrors `dart_native_api.h`. The VM copies every non-external
//! value during `Dart_PostCObject`, so an [`Encoded`] tree only has to outlive
//! the post call.

#![allow(non_camel_case_types)]

use std::ffi::CString;
use std::marker::PhantomData;
use std::os::raw::c_char;

use crate::common::error::BridgeResult;

/// Native port identifier (`Dart_Port`).
pub type Dart_Port = i64;

/// Port id meaning "no port" (`ILLEGAL_PORT`).
pub const ILLEGAL_PORT: Dart_Port = 0;

/// Type tag of a `Dart_CObject` (`Dart_CObject_Type`).
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CObjectType {
    Null = 0,
    Bool = 1,
    Int32 = 2,
    Int64 = 3,
    Double = 4,
    String = 5,
    Array = 6,
    TypedData = 7,
    ExternalTypedData = 8,
    SendPort = 9,
    Capability = 10,
    NativePointer = 11,
    Unsupported = 12,
    UnmodifiableExternalTypedData = 13,
}

/// Element type of typed data (`Dart_TypedData_Type`).
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TypedDataType {
    ByteData = 0,
    Int8 = 1,
    Uint8 = 2,
    Uint8Clamped = 3,
    Int16 = 4,
    Uint16 = 5,
    Int32 = 6,
    Uint32 = 7,
    Int64 = 8,
    Uint64 = 9,
    Float32 = 10,
    Float64 = 11,
    Int32x4 = 12,
    Float32x4 = 13,
    Float64x2 = 14,
    Invalid = 15,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct SendPortValue {
    pub id: Dart_Port,
    pub origin_id: Dart_Port,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct ArrayValue {
    pub length: isize,
    pub values: *mut *mut Dart_CObject,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct TypedDataValue {
    pub ty: TypedDataType,
    pub length: isize,
    pub values: *const u8,
}

/// Value union of a `Dart_CObject`. The padding member keeps the size equal to
/// the largest C member (`as_external_typed_data`).
#[repr(C)]
#[derive(Copy, Clone)]
pub union CObjectValue {
    pub as_bool: bool,
    pub as_int32: i32,
    pub as_int64: i64,
    pub as_double: f64,
    pub as_string: *const c_char,
    pub as_send_port: SendPortValue,
    pub as_array: ArrayValue,
    pub as_typed_data: TypedDataValue,
    _external_typed_data: [usize; 5],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct Dart_CObject {
    pub ty: CObjectType,
    pub value: CObjectValue,
}

impl Dart_CObject {
    fn new(ty: CObjectType, value: CObjectValue) -> Self {
        Self { ty, value }
    }
}

/// Owned message value that can be posted to a Dart `ReceivePort`.
#[derive(Clone, Debug, PartialEq)]
pub enum CObject {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Array(Vec<CObject>),
    /// Arrives in Dart as a `Uint8List`.
    Bytes(Vec<u8>),
    SendPort(Dart_Port),
}

impl CObject {
    /// Build the C tree for this value. Fails if a string contains a NUL byte.
    pub fn encode(&self) -> BridgeResult<Encoded<'_>> {
        let mut arena = Arena::default();
        let root = Box::new(arena.node(self)?);
        Ok(Encoded {
            root,
            arena,
            _source: PhantomData,
        })
    }
}

impl From<()> for CObject {
    fn from(_: ()) -> Self {
        CObject::Null
    }
}

impl From<bool> for CObject {
    fn from(value: bool) -> Self {
        CObject::Bool(value)
    }
}

impl From<i32> for CObject {
    fn from(value: i32) -> Self {
        CObject::Int32(value)
    }
}

impl From<i64> for CObject {
    fn from(value: i64) -> Self {
        CObject::Int64(value)
    }
}

impl From<f64> for CObject {
    fn from(value: f64) -> Self {
        CObject::Double(value)
    }
}

impl From<&str> for CObject {
    fn from(value: &str) -> Self {
        CObject::String(value.to_string())
    }
}

impl From<String> for CObject {
    fn from(value: String) -> Self {
        CObject::String(value)
    }
}

impl From<Vec<u8>> for CObject {
    fn from(value: Vec<u8>) -> Self {
        CObject::Bytes(value)
    }
}

impl<T: Into<CObject>> From<Option<T>> for CObject {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CObject::Null)
    }
}

impl From<Vec<CObject>> for CObject {
    fn from(values: Vec<CObject>) -> Self {
        CObject::Array(values)
    }
}

/// Backing storage for the nested parts of an encoded message.
#[derive(Default)]
struct Arena {
    strings: Vec<CString>,
    nodes: Vec<*mut Dart_CObject>,
    slots: Vec<Vec<*mut Dart_CObject>>,
}

impl Arena {
    fn node(&mut self, value: &CObject) -> BridgeResult<Dart_CObject> {
        let node = match value {
            CObject::Null => Dart_CObject::new(CObjectType::Null, CObjectValue { as_int64: 0 }),
            CObject::Bool(v) => Dart_CObject::new(CObjectType::Bool, CObjectValue { as_bool: *v }),
            CObject::Int32(v) => {
                Dart_CObject::new(CObjectType::Int32, CObjectValue { as_int32: *v })
            }
            CObject::Int64(v) => {
                Dart_CObject::new(CObjectType::Int64, CObjectValue { as_int64: *v })
            }
            CObject::Double(v) => {
                Dart_CObject::new(CObjectType::Double, CObjectValue { as_double: *v })
            }
            CObject::String(s) => {
                let owned = CString::new(s.as_str())?;
                let ptr = owned.as_ptr();
                self.strings.push(owned);
                Dart_CObject::new(CObjectType::String, CObjectValue { as_string: ptr })
            }
            CObject::Array(items) => {
                let mut slots = Vec::with_capacity(items.len());
                for item in items {
                    let child = Box::into_raw(Box::new(self.node(item)?));
                    self.nodes.push(child);
                    slots.push(child);
                }
                let array = ArrayValue {
                    length: slots.len() as isize,
                    values: slots.as_mut_ptr(),
                };
                self.slots.push(slots);
                Dart_CObject::new(CObjectType::Array, CObjectValue { as_array: array })
            }
            CObject::Bytes(bytes) => Dart_CObject::new(
                CObjectType::TypedData,
                CObjectValue {
                    as_typed_data: TypedDataValue {
                        ty: TypedDataType::Uint8,
                        length: bytes.len() as isize,
                        values: bytes.as_ptr(),
                    },
                },
            ),
            CObject::SendPort(id) => Dart_CObject::new(
                CObjectType::SendPort,
                CObjectValue {
                    as_send_port: SendPortValue {
                        id: *id,
                        origin_id: ILLEGAL_PORT,
                    },
                },
            ),
        };
        Ok(node)
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        for node in self.nodes.drain(..) {
            // SAFETY: every pointer in `nodes` came from `Box::into_raw` and is
            // released exactly once here.
            unsafe { drop(Box::from_raw(node)) };
        }
    }
}

/// A `Dart_CObject` tree borrowing from the [`CObject`] it was built from.
pub struct Encoded<'a> {
    root: Box<Dart_CObject>,
    arena: Arena,
    _source: PhantomData<&'a CObject>,
}

impl Encoded<'_> {
    pub fn root(&self) -> &Dart_CObject {
        &self.root
    }

    /// Pointer handed to `Dart_PostCObject`.
    pub fn as_mut_ptr(&mut self) -> *mut Dart_CObject {
        &mut *self.root
    }

    /// Number of heap nodes below the root.
    pub fn nested_nodes(&self) -> usize {
        self.arena.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn layout_matches_the_c_header() {
        assert_eq!(std::mem::size_of::<CObjectType>(), 4);
        assert_eq!(
            std::mem::size_of::<CObjectValue>(),
            5 * std::mem::size_of::<usize>()
        );
        assert_eq!(
            std::mem::align_of::<Dart_CObject>(),
            std::mem::align_of::<i64>()
        );
    }

    #[test]
    fn encodes_scalars() {
        let value = CObject::from(7i64);
        let encoded = value.encode().unwrap();
        assert_eq!(encoded.root().ty, CObjectType::Int64);
        assert_eq!(unsafe { encoded.root().value.as_int64 }, 7);

        let value = CObject::from(true);
        let encoded = value.encode().unwrap();
        assert_eq!(encoded.root().ty, CObjectType::Bool);
        assert!(unsafe { encoded.root().value.as_bool });
    }

    #[test]
    fn encodes_strings_as_nul_terminated() {
        let value = CObject::from("hello");
        let encoded = value.encode().unwrap();
        assert_eq!(encoded.root().ty, CObjectType::String);
        let text = unsafe { CStr::from_ptr(encoded.root().value.as_string) };
        assert_eq!(text.to_str().unwrap(), "hello");
    }

    #[test]
    fn rejects_interior_nul() {
        let value = CObject::from("bad\0string");
        assert!(value.encode().is_err());
    }

    #[test]
    fn encodes_nested_arrays() {
        let value = CObject::Array(vec![
            CObject::Int32(1),
            CObject::Array(vec![CObject::from("x"), CObject::Null]),
        ]);
        let encoded = value.encode().unwrap();
        assert_eq!(encoded.root().ty, CObjectType::Array);
        assert_eq!(encoded.nested_nodes(), 4);

        let array = unsafe { encoded.root().value.as_array };
        assert_eq!(array.length, 2);
        let first = unsafe { &**array.values };
        assert_eq!(first.ty, CObjectType::Int32);
        assert_eq!(unsafe { first.value.as_int32 }, 1);

        let second = unsafe { &**array.values.add(1) };
        let inner = unsafe { second.value.as_array };
        assert_eq!(inner.length, 2);
        let last = unsafe { &**inner.values.add(1) };
        assert_eq!(last.ty, CObjectType::Null);
    }

    #[test]
    fn bytes_become_uint8_typed_data() {
        let value = CObject::from(vec![1u8, 2, 3]);
        let encoded = value.encode().unwrap();
        assert_eq!(encoded.root().ty, CObjectType::TypedData);
        let data = unsafe { encoded.root().value.as_typed_data };
        assert_eq!(data.ty, TypedDataType::Uint8);
        let bytes = unsafe { std::slice::from_raw_parts(data.values, data.length as usize) };
        assert_eq!(bytes, &[1, 2, 3]);
    }

    #[test]
    fn send_ports_have_no_origin() {
        let value = CObject::SendPort(77);
        let encoded = value.encode().unwrap();
        assert_eq!(encoded.root().ty, CObjectType::SendPort);
        let port = unsafe { encoded.root().value.as_send_port };
        assert_eq!(port.id, 77);
        assert_eq!(port.origin_id, ILLEGAL_PORT);
    }

    #[test]
    fn collections_and_options_convert() {
        assert_eq!(
            CObject::from(vec![CObject::from(1i64), CObject::from(2i64)]),
            CObject::Array(vec![CObject::Int64(1), CObject::Int64(2)])
        );
        assert_eq!(CObject::from(None::<i32>), CObject::Null);
        assert_eq!(CObject::from(Some(1.5)), CObject::Double(1.5));
    }
}
