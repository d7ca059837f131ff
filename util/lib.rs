/*!
This crate contains small utilities shared by the other crates in the workspace.
*/

pub mod finite;
pub mod table;
