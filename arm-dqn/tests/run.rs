use anyhow::Result;
use arm_dqn::{eval, report::REWARD_HISTORY_FILE, train, ArmDqnConfig, RewardHistory};
use arm_dqn_candle_agent::{
    dqn::{DqnModelConfig, QNET_FILE_NAME},
    mlp::MlpConfig,
};
use arm_dqn_core::{
    dummy::{CountdownEnv, CountdownEnvConfig},
    record::BufferedRecorder,
    TrainerConfig,
};
use tempdir::TempDir;

const EPISODE_LEN: usize = 20;

fn config(model_dir: &TempDir) -> ArmDqnConfig<CountdownEnvConfig> {
    let config = ArmDqnConfig::<CountdownEnvConfig>::default();
    let agent_config = config
        .agent_config
        .clone()
        .batch_size(16)
        .target_update_interval(5);

    config
        .env_config(CountdownEnvConfig::default().episode_len(EPISODE_LEN))
        .agent_config(agent_config)
        .trainer_config(
            TrainerConfig::default()
                .n_episodes(4)
                .steps_per_episode(EPISODE_LEN)
                .save_interval(2),
        )
        .n_eval_episodes(3)
        .model_dir(model_dir.path().to_str().unwrap())
}

#[test]
fn test_train_writes_model_history_and_plots() -> Result<()> {
    let model_dir = TempDir::new("arm_dqn_train")?;
    let config = config(&model_dir);
    let mut recorder = BufferedRecorder::new();

    let history = train::<CountdownEnv>(&config, &mut recorder)?;
    assert_eq!(history.len(), 4);
    assert_eq!(recorder.len(), 4);
    for r in history.rewards() {
        assert!((0.0..=EPISODE_LEN as f32).contains(r));
    }

    let dir = model_dir.path();
    assert_eq!(RewardHistory::load(dir.join(REWARD_HISTORY_FILE))?, history);
    assert!(dir.join(QNET_FILE_NAME).is_file());
    assert!(dir.join("2").join(QNET_FILE_NAME).is_file());
    assert!(dir.join("4").join(QNET_FILE_NAME).is_file());
    for name in [
        "reward_plot.png",
        "smoothed_reward_plot.png",
        "rps_plot.png",
        "smoothed_rps_plot.png",
    ]
    .iter()
    {
        assert!(dir.join(name).is_file(), "{} is missing", name);
    }
    Ok(())
}

#[test]
fn test_eval_runs_trained_model() -> Result<()> {
    let model_dir = TempDir::new("arm_dqn_eval")?;
    let config = config(&model_dir);
    train::<CountdownEnv>(&config, &mut BufferedRecorder::new())?;

    let rewards = eval::<CountdownEnv>(&config, &config.env_config, model_dir.path())?;
    assert_eq!(rewards.len(), 3);
    for r in rewards.iter() {
        assert!((0.0..=EPISODE_LEN as f32).contains(r));
    }
    Ok(())
}

#[test]
fn test_eval_without_checkpoint_fails() -> Result<()> {
    let model_dir = TempDir::new("arm_dqn_eval_empty")?;
    let config = config(&model_dir);
    assert!(eval::<CountdownEnv>(&config, &config.env_config, model_dir.path()).is_err());
    Ok(())
}

#[test]
fn test_eval_with_other_architecture_fails() -> Result<()> {
    let model_dir = TempDir::new("arm_dqn_eval_arch")?;
    let config = config(&model_dir);
    train::<CountdownEnv>(&config, &mut BufferedRecorder::new())?;

    let model_config = DqnModelConfig::default().q_config(MlpConfig::new(6, vec![32], 8, false));
    let other = config
        .clone()
        .agent_config(config.agent_config.clone().model_config(model_config));
    assert!(eval::<CountdownEnv>(&other, &other.env_config, model_dir.path()).is_err());
    Ok(())
}
