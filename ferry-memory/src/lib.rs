mod connection;
mod cursor;
mod driver;
mod parse;
mod sql_writer;

pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use parse::Statement;
pub use sql_writer::*;
