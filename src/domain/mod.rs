pub mod naming;
pub mod order;
pub mod track;
