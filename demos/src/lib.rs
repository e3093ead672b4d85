pub mod defaults;
pub mod payment;

pub use payment::{finish_run, payment_scenario, print_batches};
pub use testing_framework_workflows::ScenarioBuilderExt;
