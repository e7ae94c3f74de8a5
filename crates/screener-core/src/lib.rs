pub mod error;
pub mod interval;
pub mod statements;
pub mod traits;
pub mod types;

pub use error::*;
pub use interval::*;
pub use statements::*;
pub use traits::*;
pub use types::*;
