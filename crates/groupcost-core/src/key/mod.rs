//! Byte keys.
//!
//! Index entries and histogram boundaries are compared as opaque byte
//! strings in plain lexicographic order. [`KeyEncoder`] turns literal
//! values into such keys so that byte order matches value order, and
//! [`uniform_portion`] locates a key between two others assuming keys are
//! spread uniformly over the byte-string space.

mod codec;
mod interpolate;

pub use codec::KeyEncoder;
pub use interpolate::uniform_portion;
