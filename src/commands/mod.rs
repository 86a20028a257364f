pub mod extract;
pub mod inspect;
pub mod split;
pub mod transform;
