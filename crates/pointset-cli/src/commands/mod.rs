pub mod extract;
pub mod inspect;
pub mod pack;
pub mod translate;
