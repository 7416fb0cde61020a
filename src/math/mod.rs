pub mod bounds;
pub mod plane;
