pub mod mimc;
pub mod zeros;
