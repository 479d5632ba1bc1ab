pub mod controller;
pub mod event;
pub mod state;
pub mod step;
pub mod timer;
