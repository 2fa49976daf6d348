//! Train [`Agent`].
mod config;
use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    replay_buffer::Transition,
    Agent, Env, ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use std::path::Path;

/// Summary of a training episode.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    /// Cumulative reward of the episode.
    pub reward: f32,

    /// The number of environment steps in the episode.
    pub env_steps: usize,

    /// The number of times the agent's optimization step was invoked,
    /// including the invocations the agent skipped.
    pub opt_calls: usize,

    /// The record returned by the last optimization step that was not skipped.
    pub record: Option<Record>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episodic training loop.
///
/// # Training loop
///
/// 0. Given an environment implementing [`Env`], an agent implementing
///    [`Agent`], a replay buffer and a recorder implementing [`Recorder`].
/// 1. For each of `n_episodes` episodes:
///     1. Reset [`Env`] and the step counter of the episode: `env_steps = 0`.
///     2. Read the high-level state `o_t` of the environment.
///     3. Sample an action `a_t` from the agent and apply it to the environment.
///     4. Push the transition `(o_t, a_t, r_t, o_t+1)` into the replay buffer.
///     5. `env_steps += 1`. If `env_steps % update_freq == 0`, invoke an
///        optimization step of the agent. The agent can skip it, for example
///        while the replay buffer holds fewer transitions than a batch.
///     6. Back to step 2 unless the episode is terminated or truncated.
///     7. Log the cumulative reward and write the record of the episode.
///     8. If `(episode + 1) % save_interval == 0`, the model parameters are
///        saved in directory `(model_dir)/(episode + 1)`.
/// 2. Return the cumulative rewards of all episodes.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[Transition]
///     C -->|ExperienceBufferBase::Item|D[ReplayBufferBase]
///     D -->|ReplayBufferBase::Batch|A
/// ```
pub struct Trainer {
    /// The number of training episodes.
    n_episodes: usize,

    /// Interval of optimization in environment steps.
    update_freq: usize,

    /// The number of environment steps in an episode.
    steps_per_episode: usize,

    /// Interval of saving the model in episodes.
    save_interval: usize,

    /// Where to save the trained model.
    model_dir: Option<String>,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            n_episodes: config.n_episodes,
            update_freq: config.update_freq,
            steps_per_episode: config.steps_per_episode,
            save_interval: config.save_interval,
            model_dir: config.model_dir,
        }
    }

    fn save_model<E, R, A>(agent: &A, model_dir: &str, episode: usize)
    where
        E: Env,
        R: ReplayBufferBase,
        A: Agent<E, R>,
    {
        let path = Path::new(model_dir).join(episode.to_string());
        match agent.save_params(&path) {
            Ok(()) => info!("Saved the model in {:?}.", &path),
            Err(e) => warn!("Failed to save model in {:?}: {}", &path, e),
        }
    }

    /// Runs a training episode.
    ///
    /// The counter of environment steps for the optimization interval
    /// starts from zero in every episode.
    pub fn train_episode<E, A, R>(
        &self,
        env: &mut E,
        agent: &mut A,
        buffer: &mut R,
    ) -> Result<EpisodeSummary>
    where
        E: Env,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
    {
        env.reset()?;
        let mut reward = 0f32;
        let mut env_steps = 0;
        let mut opt_calls = 0;
        let mut record = None;

        loop {
            let state = env.high_level_state()?;
            let act = agent.sample(&state)?;
            let (step, _) = env.step(&act)?;
            let is_done = step.is_done();
            reward += step.reward;
            buffer.push(Transition::from_step(state, step))?;
            env_steps += 1;

            if self.update_freq > 0 && env_steps % self.update_freq == 0 {
                opt_calls += 1;
                if let Some(r) = agent.opt(buffer)? {
                    record = Some(r);
                }
            }

            if is_done {
                break;
            }
        }

        Ok(EpisodeSummary {
            reward,
            env_steps,
            opt_calls,
            record,
        })
    }

    /// Trains the agent and returns the cumulative reward of each episode.
    pub fn train<E, A, R>(
        &self,
        env: &mut E,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn Recorder,
    ) -> Result<Vec<f32>>
    where
        E: Env,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
    {
        let mut rewards = Vec::with_capacity(self.n_episodes);
        agent.train();

        for episode in 0..self.n_episodes {
            let summary = self.train_episode(env, agent, buffer)?;
            let rps = summary.reward / self.steps_per_episode as f32;
            info!(
                "Episode={}, reward={}, RPS={}",
                episode, summary.reward, rps
            );

            let mut record = Record::from_slice(&[
                ("episode", Scalar(episode as f32)),
                ("reward", Scalar(summary.reward)),
                ("reward_per_step", Scalar(rps)),
                ("env_steps", Scalar(summary.env_steps as f32)),
                ("opt_calls", Scalar(summary.opt_calls as f32)),
            ]);
            if let Some(r) = summary.record {
                record.merge_inplace(r);
            }
            recorder.write(record);
            rewards.push(summary.reward);

            if self.save_interval > 0 && (episode + 1) % self.save_interval == 0 {
                match self.model_dir.as_ref() {
                    Some(model_dir) => Self::save_model::<E, R, A>(agent, model_dir, episode + 1),
                    None => warn!("model_dir is not set, skipped saving the model"),
                }
            }
        }
        recorder.flush();

        Ok(rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{CountdownEnv, CountdownEnvConfig},
        record::BufferedRecorder,
        replay_buffer::{ReplayBuffer, ReplayBufferConfig},
        DiscreteAct, Policy, VecObs,
    };
    use std::fs;
    use tempdir::TempDir;

    type Buffer = ReplayBuffer<VecObs, DiscreteAct>;

    /// Counts optimization calls and skips while the buffer is small.
    struct MockAgent {
        batch_size: usize,
        n_updates: usize,
        is_train: bool,
    }

    impl MockAgent {
        fn new(batch_size: usize) -> Self {
            Self {
                batch_size,
                n_updates: 0,
                is_train: false,
            }
        }
    }

    impl Policy<CountdownEnv> for MockAgent {
        fn sample(&mut self, _obs: &VecObs) -> Result<DiscreteAct> {
            Ok(DiscreteAct(1))
        }
    }

    impl Agent<CountdownEnv, Buffer> for MockAgent {
        fn train(&mut self) {
            self.is_train = true;
        }

        fn eval(&mut self) {
            self.is_train = false;
        }

        fn is_train(&self) -> bool {
            self.is_train
        }

        fn opt(&mut self, buffer: &mut Buffer) -> Result<Option<Record>> {
            if buffer.len() < self.batch_size {
                return Ok(None);
            }
            self.n_updates += 1;
            Ok(Some(Record::from_scalar("update_count", self.n_updates as f32)))
        }

        fn save_params(&self, path: &Path) -> Result<()> {
            fs::create_dir_all(path)?;
            fs::write(path.join("params"), self.n_updates.to_string())?;
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn env(episode_len: usize) -> CountdownEnv {
        let config = CountdownEnvConfig::default().episode_len(episode_len);
        CountdownEnv::build(&config, 0).unwrap()
    }

    fn buffer() -> Buffer {
        Buffer::build(&ReplayBufferConfig::default())
    }

    #[test]
    fn test_five_step_episode_invokes_one_update() -> Result<()> {
        let trainer = Trainer::build(TrainerConfig::default().update_freq(4));
        let mut agent = MockAgent::new(1);
        let mut buffer = buffer();
        let summary = trainer.train_episode(&mut env(5), &mut agent, &mut buffer)?;

        assert_eq!(summary.env_steps, 5);
        assert_eq!(summary.opt_calls, 1);
        assert_eq!(agent.n_updates, 1);
        assert_eq!(buffer.len(), 5);
        Ok(())
    }

    #[test]
    fn test_update_counter_restarts_every_episode() -> Result<()> {
        let trainer = Trainer::build(TrainerConfig::default().update_freq(4));
        let mut agent = MockAgent::new(1);
        let mut buffer = buffer();
        let mut env = env(6);
        for _ in 0..3 {
            let summary = trainer.train_episode(&mut env, &mut agent, &mut buffer)?;
            assert_eq!(summary.opt_calls, 1);
        }
        assert_eq!(agent.n_updates, 3);
        Ok(())
    }

    #[test]
    fn test_skipped_updates_are_still_invoked() -> Result<()> {
        let trainer = Trainer::build(TrainerConfig::default().update_freq(4));
        let mut agent = MockAgent::new(64);
        let mut buffer = buffer();
        let summary = trainer.train_episode(&mut env(5), &mut agent, &mut buffer)?;

        assert_eq!(summary.opt_calls, 1);
        assert_eq!(agent.n_updates, 0);
        assert!(summary.record.is_none());
        Ok(())
    }

    #[test]
    fn test_train_records_every_episode() -> Result<()> {
        let config = TrainerConfig::default()
            .n_episodes(3)
            .update_freq(4)
            .steps_per_episode(5);
        let trainer = Trainer::build(config);
        let mut agent = MockAgent::new(1);
        let mut buffer = buffer();
        let mut recorder = BufferedRecorder::new();
        let rewards = trainer.train(&mut env(5), &mut agent, &mut buffer, &mut recorder)?;

        assert!(agent.is_train());
        assert_eq!(rewards.len(), 3);
        assert_eq!(recorder.len(), 3);
        for (i, (record, reward)) in recorder.iter().zip(rewards.iter()).enumerate() {
            assert_eq!(record.get_scalar("episode")?, i as f32);
            assert_eq!(record.get_scalar("reward")?, *reward);
            assert_eq!(record.get_scalar("reward_per_step")?, *reward / 5.0);
            assert_eq!(record.get_scalar("opt_calls")?, 1.0);
            assert_eq!(record.get_scalar("update_count")?, (i + 1) as f32);
        }
        Ok(())
    }

    #[test]
    fn test_checkpoints_are_saved_per_interval() -> Result<()> {
        let dir = TempDir::new("trainer")?;
        let model_dir = dir.path().to_str().unwrap().to_string();
        let config = TrainerConfig::default()
            .n_episodes(4)
            .save_interval(2)
            .model_dir(model_dir);
        let trainer = Trainer::build(config);
        let mut agent = MockAgent::new(1);
        let mut buffer = buffer();
        let mut recorder = BufferedRecorder::new();
        trainer.train(&mut env(5), &mut agent, &mut buffer, &mut recorder)?;

        assert!(dir.path().join("2").join("params").exists());
        assert!(dir.path().join("4").join("params").exists());
        assert!(!dir.path().join("1").exists());
        Ok(())
    }
}
