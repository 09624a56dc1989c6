pub mod directive;
pub mod ease;
pub mod timeline;
