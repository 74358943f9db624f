pub mod universe;
pub mod universe_node;

pub use universe::ImportState;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::universe::{self, Entity as Universe};
    pub use super::universe_node::{self, Entity as UniverseNode};
}
