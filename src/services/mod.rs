pub mod bridge;
pub mod gateway;
pub mod projector;
pub mod session;
pub mod stager;
