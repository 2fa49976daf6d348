//! Double DQN agent implemented with candle.
use super::{
    config::{DqnConfig, TargetUpdate, UpdateMode},
    explorer::EpsilonGreedy,
    model::DqnModel,
};
use crate::{
    model::SubModel1,
    util::{copy_parameters, smooth_l1_loss, track, CriticLoss, InDim, OutDim},
};
use anyhow::{ensure, Context, Result};
use arm_dqn_core::{
    error::ArmDqnError,
    record::{Record, RecordValue::Scalar},
    replay_buffer::{Transition, TransitionBatch},
    Act, Agent, Env, ExperienceBufferBase, Obs, Policy, ReplayBufferBase,
};
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use log::debug;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryInto, fs, marker::PhantomData, path::Path};

/// File name of the parameters of the online network in a model directory.
pub const QNET_FILE_NAME: &str = "qnet.safetensors";

/// Double DQN agent implemented with candle.
///
/// The agent owns two action-value networks with the same structure, the
/// online network and the target network. Only the online network receives
/// gradients. The target network follows it at every
/// `target_update_interval` updates, and epsilon decays at every
/// `decay_interval` updates.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + InDim + Clone,
{
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    batch_size: usize,
    discount_factor: f64,
    explorer: EpsilonGreedy,
    target_update: TargetUpdate,
    target_update_interval: usize,
    decay_interval: usize,
    update_mode: UpdateMode,
    critic_loss: CriticLoss,
    device: Device,
    in_dim: usize,
    n_actions: usize,
    update_count: usize,
    train: bool,
    rng: SmallRng,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + InDim + Clone,
{
    /// Constructs DQN agent.
    ///
    /// The target network starts with the parameters of the online network.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        let device: Device = config.device.try_into()?;
        let (in_dim, n_actions) = {
            let q_config = config
                .model_config
                .get_q_config()
                .context("q_config is not set.")?;
            (q_config.get_in_dim(), q_config.get_out_dim())
        };
        let qnet = DqnModel::build(config.model_config.clone(), &device)?;
        let qnet_tgt = DqnModel::build(config.model_config, &device)?;
        copy_parameters(qnet.get_varmap(), qnet_tgt.get_varmap())?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            explorer: config.explorer,
            target_update: config.target_update,
            target_update_interval: config.target_update_interval,
            decay_interval: config.decay_interval,
            update_mode: config.update_mode,
            critic_loss: config.critic_loss,
            device,
            in_dim,
            n_actions,
            update_count: 0,
            train: false,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }

    /// Stacks states into a tensor of shape `[n, in_dim]`.
    fn states_tensor<'a, I>(&self, states: I) -> Result<Tensor>
    where
        I: IntoIterator<Item = &'a E::Obs>,
        E::Obs: 'a,
    {
        let mut data = vec![];
        let mut n = 0;
        for s in states {
            if s.dim() != self.in_dim {
                return Err(ArmDqnError::StateDimMismatch {
                    expected: self.in_dim,
                    got: s.dim(),
                }
                .into());
            }
            data.extend_from_slice(s.as_slice());
            n += 1;
        }
        Ok(Tensor::from_vec(data, (n, self.in_dim), &self.device)?)
    }

    /// Action indices of shape `[n, 1]`.
    fn action_tensor(&self, transitions: &[Transition<E::Obs, E::Act>]) -> Result<Tensor> {
        let mut data = Vec::with_capacity(transitions.len());
        for tr in transitions {
            let ix = tr.action().index();
            if ix >= self.n_actions {
                return Err(ArmDqnError::InvalidAction {
                    action: ix,
                    n_actions: self.n_actions,
                }
                .into());
            }
            data.push(ix as u32);
        }
        Ok(Tensor::from_vec(data, (transitions.len(), 1), &self.device)?)
    }

    fn loss_tensor(&self, transitions: &[Transition<E::Obs, E::Act>]) -> Result<Tensor> {
        let n = transitions.len();
        let states = self.states_tensor(transitions.iter().map(|tr| tr.state()))?;
        let next_states = self.states_tensor(transitions.iter().map(|tr| tr.next_state()))?;
        let actions = self.action_tensor(transitions)?;
        let rewards = transitions.iter().map(|tr| tr.reward()).collect::<Vec<_>>();
        let rewards = Tensor::from_vec(rewards, (n,), &self.device)?;

        let pred = self
            .qnet
            .forward(&states)?
            .gather(&actions, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            // The online network selects the next action, the target network evaluates it.
            let next_act = self.qnet.forward(&next_states)?.argmax_keepdim(D::Minus1)?;
            let next_q = self
                .qnet_tgt
                .forward(&next_states)?
                .gather(&next_act, D::Minus1)?
                .squeeze(D::Minus1)?;

            // Terminal transitions are not masked.
            (rewards + next_q.affine(self.discount_factor, 0.0)?)?.detach()
        };

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };
        Ok(loss)
    }

    /// Returns the loss on the batch with the current parameters.
    pub fn loss(&self, batch: &TransitionBatch<E::Obs, E::Act>) -> Result<f32> {
        ensure!(!batch.is_empty(), "Loss of an empty batch is not defined");
        Ok(self.loss_tensor(batch.as_slice())?.to_scalar::<f32>()?)
    }

    /// Performs an update step of the online network on the batch.
    ///
    /// Returns the loss before the update, or `None` for an empty batch,
    /// in which case nothing changes. After the gradient step(s),
    /// `update_count` is incremented once, then the target network and
    /// epsilon are updated if their intervals are reached.
    pub fn update(&mut self, batch: &TransitionBatch<E::Obs, E::Act>) -> Result<Option<f32>> {
        if batch.is_empty() {
            return Ok(None);
        }

        let loss = match self.update_mode {
            UpdateMode::Batch => {
                let loss = self.loss_tensor(batch.as_slice())?;
                self.qnet.backward_step(&loss)?;
                loss.to_scalar::<f32>()?
            }
            UpdateMode::PerTransition => {
                let mut loss_sum = 0f32;
                for tr in batch.iter() {
                    let loss = self.loss_tensor(std::slice::from_ref(tr))?;
                    self.qnet.backward_step(&loss)?;
                    loss_sum += loss.to_scalar::<f32>()?;
                }
                loss_sum / batch.len() as f32
            }
        };

        self.update_count += 1;
        if self.target_update_interval > 0 && self.update_count % self.target_update_interval == 0
        {
            self.sync_target()?;
        }
        if self.decay_interval > 0 && self.update_count % self.decay_interval == 0 {
            self.explorer.decay_epsilon();
        }

        Ok(Some(loss))
    }

    /// Updates the target network with the configured [`TargetUpdate`] strategy.
    pub fn sync_target(&mut self) -> Result<()> {
        match self.target_update {
            TargetUpdate::Hard => {
                copy_parameters(self.qnet.get_varmap(), self.qnet_tgt.get_varmap())?
            }
            TargetUpdate::Polyak { tau } => {
                track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), tau)?
            }
        }
        debug!("Updated target network at update {}", self.update_count);
        Ok(())
    }

    /// Action values of the online network for a state.
    pub fn q_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let xs = self.states_tensor(std::iter::once(obs))?;
        Ok(self.qnet.forward(&xs)?.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Action values of the target network for a state.
    pub fn target_q_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let xs = self.states_tensor(std::iter::once(obs))?;
        Ok(self.qnet_tgt.forward(&xs)?.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Current probability of taking a random action.
    pub fn epsilon(&self) -> f64 {
        self.explorer.epsilon
    }

    /// Sets epsilon to its lower bound, used for evaluation.
    pub fn set_epsilon_min(&mut self) {
        self.explorer.set_epsilon_min();
    }

    /// The number of completed update steps.
    pub fn update_count(&self) -> usize {
        self.update_count
    }

    /// The number of transitions sampled from the replay buffer per update.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + InDim + Clone,
{
    /// Epsilon-greedy action selection with the online network.
    ///
    /// The same rule applies in evaluation mode; lower epsilon with
    /// [`Dqn::set_epsilon_min`] before evaluation.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let xs = self.states_tensor(std::iter::once(obs))?;
        let q = self.qnet.forward(&xs)?;
        let ix = self.explorer.action(&q, &mut self.rng)?;
        Ok(E::Act::from_index(ix))
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + InDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>> + ExperienceBufferBase,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    /// Skips the update while the buffer holds fewer than `batch_size` transitions.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }

        let batch = buffer.batch(self.batch_size)?;
        let loss = self.update(&batch)?;
        let mut record = Record::from_slice(&[
            ("epsilon", Scalar(self.epsilon() as f32)),
            ("update_count", Scalar(self.update_count as f32)),
        ]);
        if let Some(loss) = loss {
            record.insert("loss", Scalar(loss));
        }

        Ok(Some(record))
    }

    /// Saves the parameters of the online network.
    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join(QNET_FILE_NAME))?;
        Ok(())
    }

    /// Loads the parameters into both the online and the target networks.
    fn load_params(&mut self, path: &Path) -> Result<()> {
        let path = path.join(QNET_FILE_NAME);
        self.qnet.load(&path)?;
        self.qnet_tgt.load(&path)?;
        Ok(())
    }
}
