use crate::{Result, types::ActionCount};
use candle_core::{DType, Device, Tensor};
use derive_more::{Deref, DerefMut, Display};

/// One value estimate per state, shape `(n_states,)`.
#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct StateValue(pub Tensor);

/// One `u32` action index per state, shape `(n_states,)`.
#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Policy(pub Tensor);

/// `u32` action indices, either `(n_states, 1)` or `(1, n_actions)`.
#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct ActionIndices(pub Tensor);

impl ActionIndices {
    /// Every action index as a single row, broadcast against all states by the expected returns.
    pub fn all(action_count: ActionCount, device: &Device) -> Result<Self> {
        let actions = Tensor::arange(0u32, *action_count as u32, device)?.unsqueeze(0)?;
        Ok(Self(actions))
    }
}

impl Policy {
    /// The policy as one action index per state.
    pub fn action_indices(&self) -> Result<ActionIndices> {
        Ok(ActionIndices(self.0.unsqueeze(1)?))
    }

    pub fn differs_from(&self, other: &Policy) -> Result<bool> {
        let changed = self
            .0
            .ne(&other.0)?
            .to_dtype(DType::U32)?
            .sum_all()?
            .to_scalar::<u32>()?;
        Ok(changed > 0)
    }

    pub fn to_vec(&self) -> Result<Vec<u32>> {
        Ok(self.0.to_vec1::<u32>()?)
    }
}

impl StateValue {
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        Ok(self.0.to_dtype(DType::F64)?.to_vec1::<f64>()?)
    }
}
