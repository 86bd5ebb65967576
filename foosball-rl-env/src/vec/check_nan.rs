use super::{DummyVecEnv, VecEnvWrapper};
use anyhow::Result;
use foosball_rl_core::{error::FrlError, Action, Observation, Step};

/// Fails on the first NaN or infinite value in actions, observations or rewards.
#[derive(Debug, Default)]
pub struct VecCheckNan;

impl VecCheckNan {
    /// Builds the stage.
    pub fn new() -> Self {
        Self
    }
}

pub(super) fn check_obs(obs: &[Observation]) -> Result<(), FrlError> {
    for (env_ix, o) in obs.iter().enumerate() {
        if let Some(value) = o.non_finite() {
            return Err(instability(value, "observations", env_ix));
        }
    }
    Ok(())
}

pub(super) fn check_rewards(reward: &[f32]) -> Result<(), FrlError> {
    for (env_ix, r) in reward.iter().enumerate() {
        if !r.is_finite() {
            let value = if r.is_nan() { "NaN" } else { "inf" };
            return Err(instability(value, "rewards", env_ix));
        }
    }
    Ok(())
}

fn instability(value: &str, target: &str, env_ix: usize) -> FrlError {
    FrlError::NumericalInstability {
        value: value.to_string(),
        target: target.to_string(),
        env_ix,
    }
}

impl VecEnvWrapper for VecCheckNan {
    fn name(&self) -> &'static str {
        "VecCheckNan"
    }

    fn action(&mut self, acts: &[Action]) -> Result<()> {
        for (env_ix, a) in acts.iter().enumerate() {
            if let Some(value) = a.non_finite() {
                return Err(instability(value, "actions", env_ix).into());
            }
        }
        Ok(())
    }

    fn reset(&mut self, obs: Vec<Observation>, _venv: &mut DummyVecEnv) -> Result<Vec<Observation>> {
        check_obs(&obs)?;
        Ok(obs)
    }

    fn step(&mut self, step: Step, _venv: &mut DummyVecEnv) -> Result<Step> {
        check_rewards(&step.reward)?;
        check_obs(&step.obs)?;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_rejects_nan_action() {
        let mut check = VecCheckNan::new();
        let acts = [
            Action::Continuous(arr1(&[0.0, 0.0])),
            Action::Continuous(arr1(&[f32::NAN, 0.0])),
        ];
        let err = check.action(&acts).unwrap_err();
        match err.downcast_ref::<FrlError>() {
            Some(FrlError::NumericalInstability { value, target, env_ix }) => {
                assert_eq!(value, "NaN");
                assert_eq!(target, "actions");
                assert_eq!(*env_ix, 1);
            }
            _ => panic!("unexpected error: {}", err),
        }
        assert!(check.action(&acts[..1]).is_ok());
    }
}
