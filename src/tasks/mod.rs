pub mod alert;
pub mod buttons;
pub mod sensor;
