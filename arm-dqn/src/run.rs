//! Training and evaluation runs on any environment with the robotic arm's
//! observation and action types.
use crate::{
    config::ArmDqnConfig,
    report::{RewardHistory, REWARD_HISTORY_FILE},
};
use anyhow::Result;
use arm_dqn_candle_agent::{dqn::Dqn, mlp::Mlp};
use arm_dqn_core::{
    record::Recorder, replay_buffer::ReplayBuffer, Agent, DefaultEvaluator, DiscreteAct, Env,
    Evaluator, ReplayBufferBase, Trainer, VecObs,
};
use log::info;
use std::{fs, path::Path};

/// Replay buffer of the arm's transitions.
pub type ArmReplayBuffer = ReplayBuffer<VecObs, DiscreteAct>;

/// Double DQN agent with an MLP action-value function.
pub type ArmDqnAgent<E> = Dqn<E, Mlp, ArmReplayBuffer>;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Trains a fresh agent and writes the results into `config.model_dir`.
///
/// The directory receives the parameters of the online network, the reward
/// history as CSV and the four reward plots. Periodic checkpoints, if
/// enabled, go to numbered subdirectories.
///
/// ```mermaid
/// flowchart LR
///   config[ArmDqnConfig] --> Trainer
///   Trainer --> params[qnet.safetensors]
///   Trainer --> csv[reward_history.csv]
///   Trainer --> png[reward plots]
///   params --> eval
/// ```
pub fn train<E>(
    config: &ArmDqnConfig<E::Config>,
    recorder: &mut dyn Recorder,
) -> Result<RewardHistory>
where
    E: Env<Obs = VecObs, Act = DiscreteAct>,
{
    let model_dir = Path::new(&config.model_dir);
    fs::create_dir_all(model_dir)?;

    let mut env = E::build(&config.env_config, 0)?;
    let mut agent = ArmDqnAgent::<E>::build(config.agent_config.clone())?;
    let mut buffer = ArmReplayBuffer::build(&config.replay_buffer_config);
    let trainer = {
        let trainer_config = config.trainer_config.clone();
        let trainer_config = match trainer_config.model_dir {
            Some(_) => trainer_config,
            None => trainer_config.model_dir(&config.model_dir),
        };
        Trainer::build(trainer_config)
    };

    let rewards = trainer.train(&mut env, &mut agent, &mut buffer, recorder)?;
    let history = RewardHistory::from(rewards);
    info!(
        "Finished training with {} updates, epsilon={}",
        agent.update_count(),
        agent.epsilon()
    );

    agent.save_params(model_dir)?;
    info!("Saved the model in {:?}", model_dir);
    history.save(model_dir.join(REWARD_HISTORY_FILE))?;
    history.save_plots(model_dir, config.trainer_config.steps_per_episode)?;

    Ok(history)
}

/// Loads trained parameters from `model_dir` and returns the cumulative
/// reward of `config.n_eval_episodes` episodes on an environment built from
/// `env_config`.
///
/// Epsilon is lowered to its minimum and no learning takes place.
pub fn eval<E>(
    config: &ArmDqnConfig<E::Config>,
    env_config: &E::Config,
    model_dir: impl AsRef<Path>,
) -> Result<Vec<f32>>
where
    E: Env<Obs = VecObs, Act = DiscreteAct>,
{
    let mut agent = ArmDqnAgent::<E>::build(config.agent_config.clone())?;
    agent.load_params(model_dir.as_ref())?;
    info!("Loaded the model from {:?}", model_dir.as_ref());
    agent.set_epsilon_min();
    agent.eval();

    let mut evaluator = DefaultEvaluator::<E>::new(env_config, 0, config.n_eval_episodes)?;
    let record = evaluator.evaluate(&mut agent)?;
    info!("Mean reward={}", record.get_scalar("mean_reward")?);

    Ok(record.get_array1("episode_rewards")?)
}
