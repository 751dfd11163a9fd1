pub mod pointer;

pub use pointer::{DropPoint, ElementGeometry};
