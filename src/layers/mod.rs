pub mod icon;
pub mod marker;
