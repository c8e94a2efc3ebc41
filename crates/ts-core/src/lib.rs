pub mod error;
pub mod expr;
pub mod stmt;
pub mod types;
pub mod value;

pub use error::ScriptError;
pub use expr::*;
pub use stmt::*;
pub use types::*;
pub use value::*;
