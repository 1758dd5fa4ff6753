//! Stacking rules applied to a tracked effect

use super::spec::GameplayEffectSpec;
use gas_graph::{
    StackDurationRefreshPolicy, StackExpirationPolicy, StackOverflowPolicy, StackPeriodResetPolicy,
    StackType,
};

/// Result of applying an effect onto an existing stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackResult {
    /// A stack was added, carrying the new count
    Added(u32),
    /// The stack is full
    Overflow(StackOverflowPolicy),
}

/// What to do once a stacking effect's duration ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpirationResult {
    Remove,
    Refreshed,
    /// One stack dropped, carrying the new count
    StackDropped(u32),
}

impl GameplayEffectSpec {
    pub fn stacks_by_source(&self) -> bool {
        self.data.stacking.stack_type == StackType::AggregateBySource
    }

    /// Add one stack, refreshing timers per the stacking policies
    pub(crate) fn try_add_stack(&mut self) -> StackResult {
        let stacking = &self.data.stacking;
        if stacking.stack_limit > 0 && self.stack_count >= stacking.stack_limit {
            return StackResult::Overflow(stacking.overflow);
        }
        self.stack_count += 1;
        if stacking.duration_refresh == StackDurationRefreshPolicy::RefreshOnSuccessfulApplication {
            self.remaining = self.duration;
        }
        if stacking.period_reset == StackPeriodResetPolicy::ResetOnSuccessfulApplication {
            self.period_timer = self.period;
        }
        StackResult::Added(self.stack_count)
    }

    pub(crate) fn on_duration_expired(&mut self) -> ExpirationResult {
        match self.data.stacking.expiration {
            StackExpirationPolicy::ClearEntireStack => ExpirationResult::Remove,
            StackExpirationPolicy::RefreshDuration => {
                self.remaining = self.duration;
                ExpirationResult::Refreshed
            }
            StackExpirationPolicy::RemoveSingleStackAndRefreshDuration => {
                if self.stack_count <= 1 {
                    return ExpirationResult::Remove;
                }
                self.stack_count -= 1;
                self.remaining = self.duration;
                ExpirationResult::StackDropped(self.stack_count)
            }
        }
    }
}
