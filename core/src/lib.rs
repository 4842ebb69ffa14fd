mod color;
mod error;
mod game;
mod mode;
mod node;
mod op;
mod structural_key;
mod tube;

pub mod test_util;

pub use color::Color;
pub use error::{TubesError, TubesResult};
pub use game::Game;
pub use mode::GameMode;
pub use node::{Node, Pos};
pub use op::Operation;
pub use structural_key::{NodeDescriptor, StructuralKey};
pub use tube::Tube;
