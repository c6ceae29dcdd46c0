// Licensed under the Apache-2.0 license

//! OEM command shims (C9): vendor extensions that ride on the same
//! codec/msgbuf foundation as the standard command sets.

pub mod ibm;
pub mod meta;
