/// Converter output stage state.
///
/// The enable path always passes through a transition state for one tick, so
/// edge detection stays decoupled from the soft-start work that runs on the
/// transition tick. Soft-start therefore runs exactly once per enable edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputState {
    Disabled,
    TransitionToEnabled,
    Enabled,
    TransitionToDisabled,
}

/// Drives [`OutputState`] from the link's enable request, one step per tick.
pub struct OutputControl {
    state: OutputState,
}

impl OutputControl {
    pub fn new() -> Self {
        Self {
            state: OutputState::Disabled,
        }
    }

    /// Advances the state machine and returns the state for this tick.
    pub fn tick(&mut self, request: bool) -> OutputState {
        let next = match self.state {
            OutputState::Disabled if request => OutputState::TransitionToEnabled,
            OutputState::Disabled => OutputState::Disabled,
            OutputState::TransitionToEnabled => OutputState::Enabled,
            OutputState::Enabled if !request => OutputState::TransitionToDisabled,
            OutputState::Enabled => OutputState::Enabled,
            OutputState::TransitionToDisabled => OutputState::Disabled,
        };
        #[cfg(feature = "defmt")]
        if next != self.state {
            defmt::info!("output state -> {}", next);
        }
        self.state = next;
        self.state
    }

    pub fn state(&self) -> OutputState {
        self.state
    }
}

impl Default for OutputControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_takes_exactly_two_ticks() {
        let mut control = OutputControl::new();
        assert_eq!(control.tick(true), OutputState::TransitionToEnabled);
        assert_eq!(control.tick(true), OutputState::Enabled);
    }

    #[test]
    fn never_enabled_after_one_tick() {
        let mut control = OutputControl::new();
        assert_ne!(control.tick(true), OutputState::Enabled);
    }

    #[test]
    fn disable_takes_two_ticks_and_settles() {
        let mut control = OutputControl::new();
        control.tick(true);
        control.tick(true);
        assert_eq!(control.tick(false), OutputState::TransitionToDisabled);
        assert_eq!(control.tick(false), OutputState::Disabled);
        assert_eq!(control.tick(false), OutputState::Disabled);
    }

    #[test]
    fn transition_states_ignore_the_request_input() {
        let mut control = OutputControl::new();
        control.tick(true);
        // Request dropped mid-transition: the transition still completes
        assert_eq!(control.tick(false), OutputState::Enabled);
        // And the dropped request is honored on the following tick
        assert_eq!(control.tick(false), OutputState::TransitionToDisabled);
    }
}
