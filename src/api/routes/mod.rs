pub mod dashboard;
pub mod health;
pub mod heroes;
pub mod images;
