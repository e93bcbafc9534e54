pub mod admin;
pub mod assets;
pub mod cases;
pub mod deadlines;
pub mod payment;
pub mod retention;
