pub mod art;
pub mod cell;
pub mod grid;
pub mod product;
pub mod timer;
