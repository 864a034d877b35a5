//! Names provided by the ES2018 standard library declarations
//!
//! Only the meaning (type, value, namespace) of each name matters to the
//! checker, so members are not modelled.

use super::check::{NAMESPACE, TYPE, VALUE};

const TYPES: &[&str] = &[
  "ArrayBufferLike",
  "ArrayBufferTypes",
  "ArrayBufferView",
  "ArrayConstructor",
  "ArrayLike",
  "AsyncGenerator",
  "AsyncIterable",
  "AsyncIterableIterator",
  "AsyncIterator",
  "Awaited",
  "BooleanConstructor",
  "CallableFunction",
  "Capitalize",
  "ClassDecorator",
  "ConcatArray",
  "ConstructorParameters",
  "DateConstructor",
  "ErrorConstructor",
  "Exclude",
  "Extract",
  "FunctionConstructor",
  "Generator",
  "IArguments",
  "ImportMeta",
  "InstanceType",
  "Iterable",
  "IterableIterator",
  "Iterator",
  "IteratorResult",
  "IteratorReturnResult",
  "IteratorYieldResult",
  "Lowercase",
  "MapConstructor",
  "MethodDecorator",
  "NewableFunction",
  "NoInfer",
  "NonNullable",
  "NumberConstructor",
  "ObjectConstructor",
  "Omit",
  "OmitThisParameter",
  "ParameterDecorator",
  "Parameters",
  "Partial",
  "Pick",
  "PromiseConstructor",
  "PromiseConstructorLike",
  "PromiseLike",
  "PropertyDecorator",
  "PropertyDescriptor",
  "PropertyDescriptorMap",
  "PropertyKey",
  "ProxyConstructor",
  "ProxyHandler",
  "Readonly",
  "ReadonlyArray",
  "ReadonlyMap",
  "ReadonlySet",
  "Record",
  "RegExpConstructor",
  "RegExpExecArray",
  "RegExpMatchArray",
  "Required",
  "ReturnType",
  "SetConstructor",
  "StringConstructor",
  "SymbolConstructor",
  "TemplateStringsArray",
  "ThisParameterType",
  "ThisType",
  "TypedPropertyDescriptor",
  "Uncapitalize",
  "Uppercase",
  "WeakMapConstructor",
  "WeakSetConstructor",
];

/// Declared both as an interface and a global value
const TYPES_AND_VALUES: &[&str] = &[
  "Array",
  "ArrayBuffer",
  "Atomics",
  "Boolean",
  "DataView",
  "Date",
  "Error",
  "EvalError",
  "Float32Array",
  "Float64Array",
  "Function",
  "Int16Array",
  "Int32Array",
  "Int8Array",
  "JSON",
  "Map",
  "Math",
  "Number",
  "Object",
  "Promise",
  "RangeError",
  "ReferenceError",
  "RegExp",
  "Set",
  "SharedArrayBuffer",
  "String",
  "Symbol",
  "SyntaxError",
  "TypeError",
  "URIError",
  "Uint16Array",
  "Uint32Array",
  "Uint8Array",
  "Uint8ClampedArray",
  "WeakMap",
  "WeakSet",
];

const VALUES: &[&str] = &[
  "Infinity",
  "NaN",
  "Proxy",
  "decodeURI",
  "decodeURIComponent",
  "encodeURI",
  "encodeURIComponent",
  "escape",
  "eval",
  "globalThis",
  "isFinite",
  "isNaN",
  "parseFloat",
  "parseInt",
  "undefined",
  "unescape",
];

const NAMESPACES: &[&str] = &["Intl", "Reflect"];

/// Meaning bits of a standard library name, if it exists
pub fn lookup(name: &str) -> Option<u8> {
  if TYPES_AND_VALUES.contains(&name) {
    Some(TYPE | VALUE)
  } else if TYPES.contains(&name) {
    Some(TYPE)
  } else if VALUES.contains(&name) {
    Some(VALUE)
  } else if NAMESPACES.contains(&name) {
    Some(NAMESPACE | VALUE)
  } else {
    None
  }
}
