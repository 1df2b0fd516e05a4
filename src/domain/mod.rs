mod editor;
mod error;
mod expense;
mod money;
mod settlement;
mod shares;
mod view;

pub use editor::*;
pub use error::*;
pub use expense::*;
pub use money::*;
pub use settlement::*;
pub use shares::*;
pub use view::*;
