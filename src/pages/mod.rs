pub mod canvas;
pub mod home;
pub mod not_found;
