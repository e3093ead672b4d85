use testing_framework_config::{
    CloseMode, HarnessConfig,
    constants::{DEFAULT_AMOUNT_MEAN, DEFAULT_BATCH_SIZE, DEFAULT_BATCHES},
};
use testing_framework_core::scenario::Builder as CoreScenarioBuilder;

use crate::{
    expectations::PhaseCompletion,
    workloads::{
        accounts::AccountPairWorkload,
        close::CloseWorkload,
        registration::RegistrationWorkload,
        transfer::{ParticipantSelection, TransferSuccessRate, TransferWorkload},
    },
};

/// Extension methods for building payment scenarios with common patterns.
pub trait ScenarioBuilderExt: Sized {
    /// Configure the full register / open / transfer / close flow.
    fn payment_flow(self) -> PaymentFlowBuilder;

    /// Configure the payment flow via closure.
    fn payment_flow_with(
        self,
        f: impl FnOnce(PaymentFlowBuilder) -> PaymentFlowBuilder,
    ) -> CoreScenarioBuilder;

    #[must_use]
    /// Attach a phase completion expectation.
    fn expect_phase_completion(self) -> Self;

    #[must_use]
    /// Require at least `min_ratio` of all transfers to succeed.
    fn expect_transfer_success_rate(self, min_ratio: f64) -> Self;
}

impl ScenarioBuilderExt for CoreScenarioBuilder {
    fn payment_flow(self) -> PaymentFlowBuilder {
        PaymentFlowBuilder::new(self)
    }

    fn payment_flow_with(
        self,
        f: impl FnOnce(PaymentFlowBuilder) -> PaymentFlowBuilder,
    ) -> CoreScenarioBuilder {
        f(self.payment_flow()).apply()
    }

    fn expect_phase_completion(self) -> Self {
        self.with_expectation(PhaseCompletion)
    }

    fn expect_transfer_success_rate(self, min_ratio: f64) -> Self {
        if !(0.0..=1.0).contains(&min_ratio) {
            tracing::warn!(
                min_ratio,
                "transfer success ratio must be within [0, 1]; ignoring expectation"
            );
            return self;
        }
        self.with_expectation(TransferSuccessRate::new(min_ratio))
    }
}

/// Builder for the payment flow workloads.
pub struct PaymentFlowBuilder {
    builder: CoreScenarioBuilder,
    batches: usize,
    batch_size: usize,
    amount_mean: f64,
    close_mode: CloseMode,
    close_passes: usize,
    selection: ParticipantSelection,
}

impl PaymentFlowBuilder {
    fn new(builder: CoreScenarioBuilder) -> Self {
        Self {
            builder,
            batches: DEFAULT_BATCHES,
            batch_size: DEFAULT_BATCH_SIZE,
            amount_mean: DEFAULT_AMOUNT_MEAN,
            close_mode: CloseMode::default(),
            close_passes: 1,
            selection: ParticipantSelection::default(),
        }
    }

    #[must_use]
    /// Number of transfer batches (B).
    pub const fn batches(mut self, batches: usize) -> Self {
        self.batches = batches;
        self
    }

    #[must_use]
    /// Transfers per batch (K).
    pub const fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn amount_mean(mut self, mean: f64) -> Self {
        self.amount_mean = mean;
        self
    }

    #[must_use]
    pub const fn close_mode(mut self, mode: CloseMode) -> Self {
        self.close_mode = mode;
        self
    }

    #[must_use]
    /// Run the closing phase `passes` times. Passes after the first hit pairs
    /// that are already closed.
    pub fn close_passes(mut self, passes: usize) -> Self {
        if passes == 0 {
            tracing::warn!("close passes must be non-zero; keeping a single pass");
            return self;
        }
        self.close_passes = passes;
        self
    }

    #[must_use]
    pub const fn participants(mut self, selection: ParticipantSelection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    /// Take batch shape, amount mean and close mode from a harness config.
    pub const fn from_config(mut self, config: &HarnessConfig) -> Self {
        self.batches = config.batches;
        self.batch_size = config.batch_size;
        self.amount_mean = config.amount_mean;
        self.close_mode = config.close_mode;
        self
    }

    #[must_use]
    /// Finalize the flow and return the underlying scenario builder.
    pub fn apply(self) -> CoreScenarioBuilder {
        let mut builder = self
            .builder
            .with_workload(RegistrationWorkload::new())
            .with_workload(AccountPairWorkload::new(self.amount_mean))
            .with_workload(
                TransferWorkload::new(self.batches, self.batch_size).with_selection(self.selection),
            );

        for _ in 0..self.close_passes {
            builder = builder.with_workload(CloseWorkload::new(self.close_mode));
        }

        tracing::info!(
            batches = self.batches,
            batch_size = self.batch_size,
            amount_mean = self.amount_mean,
            close_mode = %self.close_mode,
            close_passes = self.close_passes,
            "payment flow configured"
        );
        builder
    }
}
