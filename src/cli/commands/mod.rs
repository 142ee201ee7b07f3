pub mod catalog;
pub mod form;
pub mod status;
