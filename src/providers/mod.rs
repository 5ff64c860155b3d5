pub mod bundled;
pub mod cldr;
