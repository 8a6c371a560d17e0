pub mod key_press;
pub mod layout;
pub mod order;
