pub mod clock;
pub mod study;
pub mod trial;
