use indexmap::IndexSet;

use crate::{
    casing::CasingStrategy,
    error::FactoryError,
    field::Fields,
    model::{FactoryModel, StateCallback},
};

/// States registered on a builder for its next production call.
#[derive(Debug, Clone, Default)]
pub struct StatesManager {
    registered: IndexSet<String>,
}

impl StatesManager {
    /// Registers a state; registering a name twice keeps its first position.
    pub fn register(&mut self, state: impl Into<String>) {
        self.registered.insert(state.into());
    }

    /// Pending state names in registration order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Unregisters every state. The factory's state definitions are untouched.
    pub fn reset(&mut self) {
        self.registered.clear();
    }

    fn get_state_callback<'a>(
        &self,
        factory: &'a FactoryModel,
        state: &str,
    ) -> Result<&'a StateCallback, FactoryError> {
        if state.trim().is_empty() {
            return Err(FactoryError::EmptyStateName);
        }

        factory
            .state_callback(state)
            .ok_or_else(|| FactoryError::UnknownState(state.to_string()))
    }

    /// Applies every registered state to every row.
    ///
    /// States run in registration order; each one sees the row as left by the
    /// previous one, and its patch overwrites conflicting fields. Patch keys are
    /// renamed with `casing` first, matching the casing of `rows`.
    ///
    /// # Arguments
    /// - `rows` - Rows after override merging
    /// - `factory` - Definition holding the state callbacks
    /// - `casing` - Insert casing of the rows
    ///
    /// # Returns
    /// - `Ok(Vec<Fields>)` - Rows with all states applied
    /// - `Err(FactoryError::EmptyStateName)` - A registered name is empty
    /// - `Err(FactoryError::UnknownState)` - A registered name is not defined
    pub fn apply_states(
        &self,
        mut rows: Vec<Fields>,
        factory: &FactoryModel,
        casing: CasingStrategy,
    ) -> Result<Vec<Fields>, FactoryError> {
        for state in &self.registered {
            let callback = self.get_state_callback(factory, state)?;

            for row in rows.iter_mut() {
                let patch = callback(row);
                row.merge_fields(patch.convert_keys(casing));
            }
        }

        Ok(rows)
    }
}
