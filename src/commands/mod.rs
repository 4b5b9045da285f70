pub mod inspect;
pub mod organize;
pub mod rename;
