pub mod model;
pub mod yolo;
