pub mod detect;
pub mod history;
pub mod info;
pub mod synth;
