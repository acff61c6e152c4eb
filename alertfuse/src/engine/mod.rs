pub mod blast;
pub mod cluster;
pub mod confidence;
pub mod decision;
