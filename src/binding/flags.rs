//! Flags threaded through binding evaluation and lifecycle calls.

use bitflags::bitflags;

bitflags! {
    /// Context flags describing why a binding is being evaluated or a
    /// change is being signalled.
    ///
    /// `FROM_BIND` is the important one: observers suppress subscriber
    /// notification for writes carrying it, because the binding that is
    /// being set up is itself the source of the value.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BindingFlags: u8 {
        /// Initial value propagation while a binding is being bound.
        const FROM_BIND       = 0b00001;
        /// Teardown propagation while a binding is being unbound.
        const FROM_UNBIND     = 0b00010;
        /// The call originates from a shell start task.
        const FROM_START_TASK = 0b00100;
        /// The call originates from a shell stop task.
        const FROM_STOP_TASK  = 0b01000;
        /// The call originates from a frame tick refresh.
        const FROM_TICK       = 0b10000;
    }
}

bitflags! {
    /// Direction(s) a property binding moves data in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BindingMode: u8 {
        /// Source evaluated once at bind time, never refreshed.
        const ONE_TIME  = 0b001;
        /// Source to target on bind and on every source change.
        const TO_VIEW   = 0b010;
        /// Target to source on target change.
        const FROM_VIEW = 0b100;
        /// Both directions.
        const TWO_WAY   = Self::TO_VIEW.bits() | Self::FROM_VIEW.bits();
    }
}

impl Default for BindingMode {
    fn default() -> Self {
        BindingMode::TO_VIEW
    }
}
