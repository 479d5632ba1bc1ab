pub mod blessing;
pub mod confetti;
pub mod motes;
