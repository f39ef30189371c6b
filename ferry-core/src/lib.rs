mod as_value;
mod bulk;
mod cursor;
mod decode_type;
mod enumerator;
mod error;
mod executor;
mod fetch;
mod field;
mod options;
mod projection;
mod query;
mod reader;
mod reconcile;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use bulk::*;
pub use cursor::*;
pub use decode_type::*;
pub use enumerator::*;
pub use error::*;
pub use executor::*;
pub use fetch::*;
pub use field::*;
pub use options::*;
pub use projection::*;
pub use query::*;
pub use reader::*;
pub use reconcile::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
