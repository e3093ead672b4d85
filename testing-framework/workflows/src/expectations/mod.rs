mod phase_completion;

pub use phase_completion::PhaseCompletion;
