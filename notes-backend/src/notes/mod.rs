//! Note domain logic: the content codec, sparse position keys and
//! one-level reference expansion. Storage lives in `db::tables`.

pub mod content;
pub mod expand;
pub mod positions;
