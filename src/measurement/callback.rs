use super::{Measurement, MeasurementHandle};
use crate::error::Result;
use crate::sim::simulation::Simulation;
use crate::sim::state::SimulationState;

/// What a callback wants the driver to do after the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    #[default]
    Continue,
    Stop,
}

/// Closure measurement carrying caller-owned data `T`.
///
/// The closure gets the current state, the tick count as time, and `T`.
/// Returning [`Control::Stop`] ends the run once the tick's measurements are done.
pub struct CallbackMeasurement<T, F> {
    name: String,
    user_data: T,
    callback: F,
}

impl<T, F> CallbackMeasurement<T, F>
where
    F: FnMut(&SimulationState<'_>, f64, &mut T) -> Control,
{
    pub fn new(name: impl Into<String>, user_data: T, callback: F) -> Self {
        Self {
            name: name.into(),
            user_data,
            callback,
        }
    }

    pub fn user_data(&self) -> &T {
        &self.user_data
    }
}

impl<T: 'static, F> CallbackMeasurement<T, F>
where
    F: FnMut(&SimulationState<'_>, f64, &mut T) -> Control + 'static,
{
    pub fn handle(name: impl Into<String>, user_data: T, callback: F) -> MeasurementHandle {
        MeasurementHandle::new(Box::new(Self::new(name, user_data, callback)))
    }
}

impl<T, F> Measurement for CallbackMeasurement<T, F>
where
    F: FnMut(&SimulationState<'_>, f64, &mut T) -> Control,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&mut self, sim: &mut Simulation) -> Result<()> {
        let control = match sim.state() {
            Some(state) => (self.callback)(&state, state.time() as f64, &mut self.user_data),
            None => Control::Continue,
        };
        if control == Control::Stop {
            sim.stop()?;
        }
        Ok(())
    }
}
